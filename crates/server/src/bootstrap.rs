use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use tripcover_agent::{
    quote_api_from_config, InMemorySessionStore, Orchestrator, QuoteApiMode, SessionStore,
};
use tripcover_core::config::{AppConfig, ConfigError};
use tripcover_core::ApplicationError;

pub struct Application {
    pub config: AppConfig,
    pub quote_api_mode: QuoteApiMode,
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("quotation client setup failed: {0}")]
    QuoteApi(#[source] ApplicationError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let quote_api = quote_api_from_config(&config).map_err(BootstrapError::QuoteApi)?;
    let quote_api_mode = quote_api.mode();

    let idle_timeout = Duration::from_secs(config.server.session_idle_timeout_secs);
    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::with_idle_timeout(idle_timeout));
    let orchestrator = Arc::new(Orchestrator::with_defaults(sessions, quote_api));
    info!(
        event_name = "system.bootstrap.ready",
        quote_api_mode = quote_api_mode.as_str(),
        session_store = "in_memory",
        session_idle_timeout_secs = config.server.session_idle_timeout_secs,
        "conversation runtime assembled"
    );

    Ok(Application { config, quote_api_mode, orchestrator })
}

#[cfg(test)]
mod tests {
    use tripcover_agent::QuoteApiMode;
    use tripcover_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use tripcover_core::SessionId;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    #[test]
    fn config_errors_surface_as_bootstrap_errors() {
        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                quote_api_base_url: Some("ftp://quotes.example".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(BootstrapError::from)
        .err()
        .expect("invalid base url must be rejected");

        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("quote_api.base_url"));
    }

    #[tokio::test]
    async fn bootstrap_wires_a_working_conversation_in_mock_mode() {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap should succeed");

        assert_eq!(app.quote_api_mode, QuoteApiMode::Mock);
        let reply = app.orchestrator.handle_message("hello", &SessionId::from("sess-boot")).await;
        assert!(reply.starts_with("Hello!"));
    }

    #[test]
    fn live_mode_is_selected_when_mock_is_disabled() {
        let mut config = AppConfig::default();
        config.quote_api.mock_mode = false;
        config.quote_api.base_url = "http://127.0.0.1:9".to_string();

        let app = bootstrap_with_config(config).expect("bootstrap should succeed");

        assert_eq!(app.quote_api_mode, QuoteApiMode::Live);
        assert_eq!(app.config.quote_endpoint(), "http://127.0.0.1:9/api/v2/quotation/generate");
    }
}
