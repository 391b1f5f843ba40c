pub mod chat;
pub mod config;
pub mod quote;

use serde::Serialize;
use tripcover_core::config::ConfigError;

/// Printed output plus process exit code. Non-zero codes identify the failing
/// step: 2 config, 3 payload, 4 client setup, 5 runtime, 6 quotation, 7 terminal I/O.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: CommandStatus,
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let outcome = CommandOutcome {
            command,
            status: CommandStatus::Ok,
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: render(&outcome) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let outcome = CommandOutcome {
            command,
            status: CommandStatus::Error,
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: render(&outcome) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        Self::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    }
}

fn render(outcome: &CommandOutcome<'_>) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|error| {
        serde_json::json!({
            "command": outcome.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}
