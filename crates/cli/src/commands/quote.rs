use std::fs;
use std::path::Path;

use tripcover_agent::quote_api_from_config;
use tripcover_core::config::{AppConfig, LoadOptions};
use tripcover_core::{render_plan_comparison, QuotePayload};

use crate::commands::CommandResult;

pub fn run(payload_path: &Path) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("quote", &error),
    };

    let raw = match fs::read_to_string(payload_path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "payload_read",
                format!("could not read `{}`: {error}", payload_path.display()),
                3,
            );
        }
    };
    let payload = match serde_json::from_str(&raw).map(QuotePayload) {
        Ok(payload) => payload,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "payload_parse",
                format!("`{}` is not valid JSON: {error}", payload_path.display()),
                3,
            );
        }
    };

    let quote_api = match quote_api_from_config(&config) {
        Ok(quote_api) => quote_api,
        Err(error) => {
            return CommandResult::failure("quote", error.error_class(), error.to_string(), 4);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                5,
            );
        }
    };

    let result = runtime.block_on(quote_api.fetch_quotes(&payload));
    if !result.success {
        return CommandResult::failure("quote", "quote_api", result.first_error(), 6);
    }
    if result.premiums.is_empty() {
        return CommandResult::failure("quote", "quote_api", "quotation returned no premiums", 6);
    }

    CommandResult::success("quote", render_plan_comparison(&result.premiums))
}
