use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_QUOTE_API_BASE_URL: &str = "https://api-sandbox.hlas.com.sg";
pub const DEFAULT_QUOTE_API_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 3600;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub quote_api: QuoteApiConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteApiConfig {
    pub base_url: String,
    /// Serve the fixed premium table instead of calling the quotation service.
    pub mock_mode: bool,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Sessions untouched for this long are dropped from the in-memory store.
    pub session_idle_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub quote_api_base_url: Option<String>,
    pub quote_api_mock_mode: Option<bool>,
    pub quote_api_timeout_secs: Option<u64>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quote_api: QuoteApiConfig {
                base_url: DEFAULT_QUOTE_API_BASE_URL.to_string(),
                mock_mode: true,
                timeout_secs: DEFAULT_QUOTE_API_TIMEOUT_SECS,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tripcover.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Endpoint the live client posts quote requests to.
    pub fn quote_endpoint(&self) -> String {
        format!("{}{}", self.quote_api.base_url.trim_end_matches('/'), QUOTE_ENDPOINT_PATH)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(quote_api) = patch.quote_api {
            if let Some(base_url) = quote_api.base_url {
                self.quote_api.base_url = base_url;
            }
            if let Some(mock_mode) = quote_api.mock_mode {
                self.quote_api.mock_mode = mock_mode;
            }
            if let Some(timeout_secs) = quote_api.timeout_secs {
                self.quote_api.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(idle_timeout) = server.session_idle_timeout_secs {
                self.server.session_idle_timeout_secs = idle_timeout;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for (setting, keys) in ENV_KEYS {
            let Some((key, value)) = read_env_any(keys) else {
                continue;
            };
            match *setting {
                "quote_api.base_url" => self.quote_api.base_url = value,
                "quote_api.mock_mode" => self.quote_api.mock_mode = parse_bool_like(key, &value)?,
                "quote_api.timeout_secs" => self.quote_api.timeout_secs = parse_env(key, &value)?,
                "server.bind_address" => self.server.bind_address = value,
                "server.port" => self.server.port = parse_env(key, &value)?,
                "server.session_idle_timeout_secs" => {
                    self.server.session_idle_timeout_secs = parse_env(key, &value)?
                }
                "logging.level" => self.logging.level = value,
                "logging.format" => self.logging.format = value.parse()?,
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.quote_api_base_url {
            self.quote_api.base_url = base_url;
        }
        if let Some(mock_mode) = overrides.quote_api_mock_mode {
            self.quote_api.mock_mode = mock_mode;
        }
        if let Some(timeout_secs) = overrides.quote_api_timeout_secs {
            self.quote_api.timeout_secs = timeout_secs;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_quote_api(&self.quote_api)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub const QUOTE_ENDPOINT_PATH: &str = "/api/v2/quotation/generate";

/// Environment keys consulted for each setting, first match wins.
pub const ENV_KEYS: &[(&str, &[&str])] = &[
    ("quote_api.base_url", &["TRIPCOVER_QUOTE_API_BASE_URL", "API_BASE_URL"]),
    ("quote_api.mock_mode", &["TRIPCOVER_QUOTE_API_MOCK_MODE", "TEST_MODE"]),
    ("quote_api.timeout_secs", &["TRIPCOVER_QUOTE_API_TIMEOUT_SECS"]),
    ("server.bind_address", &["TRIPCOVER_SERVER_BIND_ADDRESS"]),
    ("server.port", &["TRIPCOVER_SERVER_PORT"]),
    ("server.session_idle_timeout_secs", &["TRIPCOVER_SERVER_SESSION_IDLE_TIMEOUT_SECS"]),
    ("logging.level", &["TRIPCOVER_LOGGING_LEVEL", "TRIPCOVER_LOG_LEVEL"]),
    ("logging.format", &["TRIPCOVER_LOGGING_FORMAT", "TRIPCOVER_LOG_FORMAT"]),
];

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tripcover.toml"), PathBuf::from("config/tripcover.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references; every referenced variable must be set.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_quote_api(quote_api: &QuoteApiConfig) -> Result<(), ConfigError> {
    let base_url = quote_api.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "quote_api.base_url must start with http:// or https://".to_string(),
        ));
    }

    if quote_api.timeout_secs == 0 || quote_api.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "quote_api.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.session_idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "server.session_idle_timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_any(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| read_env(key).map(|value| (*key, value)))
}

/// Accepts true/false, 1/0, yes/no and on/off in any case.
pub fn parse_bool_like(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    quote_api: Option<QuoteApiPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteApiPatch {
    base_url: Option<String>,
    mock_mode: Option<bool>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    session_idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, ENV_KEYS};

    fn lock_env() -> Result<MutexGuard<'static, ()>, String> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().map_err(|_| "env lock poisoned".to_string())
    }

    fn clear_config_env() {
        for (_, keys) in ENV_KEYS {
            for key in *keys {
                env::remove_var(key);
            }
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_select_mock_mode_against_sandbox() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.quote_api.mock_mode, "mock mode should be enabled by default")?;
        ensure(config.quote_api.timeout_secs == 15, "default timeout should be 15 seconds")?;
        ensure(
            config.quote_endpoint()
                == "https://api-sandbox.hlas.com.sg/api/v2/quotation/generate",
            "endpoint should join base url and quotation path",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();
        env::set_var("TEST_QUOTE_HOST", "https://quotes.example.test");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tripcover.toml");
            fs::write(
                &path,
                r#"
[quote_api]
base_url = "${TEST_QUOTE_HOST}/"
mock_mode = false
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(!config.quote_api.mock_mode, "file should switch to live mode")?;
            ensure(
                config.quote_endpoint()
                    == "https://quotes.example.test/api/v2/quotation/generate",
                "base url should be interpolated from the environment",
            )
        })();

        env::remove_var("TEST_QUOTE_HOST");
        result
    }

    #[test]
    fn legacy_env_names_are_honoured() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();
        env::set_var("API_BASE_URL", "http://localhost:9999");
        env::set_var("TEST_MODE", "False");
        env::set_var("TRIPCOVER_LOG_LEVEL", "warn");
        env::set_var("TRIPCOVER_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.quote_api.base_url == "http://localhost:9999", "alias base url")?;
            ensure(!config.quote_api.mock_mode, "TEST_MODE=False should select live mode")?;
            ensure(config.logging.level == "warn", "log level alias should apply")?;
            ensure(matches!(config.logging.format, LogFormat::Pretty), "format alias should apply")
        })();

        clear_config_env();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();
        env::set_var("TRIPCOVER_QUOTE_API_TIMEOUT_SECS", "20");
        env::set_var("TRIPCOVER_SERVER_PORT", "9090");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tripcover.toml");
            fs::write(
                &path,
                r#"
[quote_api]
timeout_secs = 5

[server]
port = 7070
session_idle_timeout_secs = 600

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    server_port: Some(6060),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.quote_api.timeout_secs == 20, "env timeout should win over file")?;
            ensure(
                config.server.session_idle_timeout_secs == 600,
                "file idle timeout should replace the default",
            )?;
            ensure(config.server.port == 6060, "override port should win over env")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_config_env();
        result
    }

    #[test]
    fn invalid_mock_flag_is_reported_with_its_key() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();
        env::set_var("TRIPCOVER_QUOTE_API_MOCK_MODE", "maybe");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(error) => ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "TRIPCOVER_QUOTE_API_MOCK_MODE"
                ),
                "error should name the offending variable",
            ),
        };

        clear_config_env();
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                quote_api_base_url: Some("ftp://quotes.example.test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };

        ensure(
            matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("quote_api.base_url")
            ),
            "validation failure should mention quote_api.base_url",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "require_file should fail when the file is absent",
        )
    }

    #[test]
    fn zero_session_idle_timeout_is_rejected() -> Result<(), String> {
        let _guard = lock_env()?;
        clear_config_env();
        env::set_var("TRIPCOVER_SERVER_SESSION_IDLE_TIMEOUT_SECS", "0");

        let result = AppConfig::load(LoadOptions::default());
        clear_config_env();

        ensure(
            matches!(
                result,
                Err(ConfigError::Validation(ref message))
                    if message.contains("session_idle_timeout_secs")
            ),
            "zero idle timeout should fail validation",
        )
    }
}
