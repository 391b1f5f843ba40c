use std::env;
use std::fs;
use std::path::Path;

use toml::Value;
use tripcover_core::config::{resolve_config_path, AppConfig, LoadOptions, ENV_KEYS};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str| {
        field_source(key_path, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let values = [
        ("quote_api.base_url", config.quote_api.base_url.clone()),
        ("quote_api.mock_mode", config.quote_api.mock_mode.to_string()),
        ("quote_api.timeout_secs", config.quote_api.timeout_secs.to_string()),
        ("quote_api.endpoint", config.quote_endpoint()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.session_idle_timeout_secs", config.server.session_idle_timeout_secs.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format).to_ascii_lowercase()),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(values.iter().map(|(key, value)| render_line(key, value, source(key))));
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if key_path == "quote_api.endpoint" {
        return "derived (quote_api.base_url)".to_string();
    }

    let env_keys = ENV_KEYS
        .iter()
        .find(|(path, _)| *path == key_path)
        .map(|(_, keys)| *keys)
        .unwrap_or_default();
    if let Some(env_key) = env_keys.iter().find(|key| {
        env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    }) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
