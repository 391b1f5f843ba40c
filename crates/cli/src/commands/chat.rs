use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tripcover_agent::{quote_api_from_config, InMemorySessionStore, Orchestrator};
use tripcover_core::config::{AppConfig, LoadOptions};
use tripcover_core::SessionId;

use crate::commands::CommandResult;

const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

pub fn run(session: Option<String>) -> CommandResult {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_io(session, stdin.lock(), stdout.lock())
}

/// Reads one message per line until end of input or `exit`/`quit`, writing each
/// reply prefixed with `assistant>`.
pub fn run_with_io(
    session: Option<String>,
    input: impl BufRead,
    mut output: impl Write,
) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("chat", &error),
    };
    let quote_api = match quote_api_from_config(&config) {
        Ok(quote_api) => quote_api,
        Err(error) => {
            return CommandResult::failure("chat", error.error_class(), error.to_string(), 4);
        }
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                5,
            );
        }
    };

    let orchestrator = Arc::new(Orchestrator::with_defaults(
        Arc::new(InMemorySessionStore::new()),
        quote_api,
    ));
    let session_id = SessionId::from(
        session.unwrap_or_else(|| format!("cli_{}", std::process::id())),
    );

    let mut turns = 0usize;
    for line in input.lines() {
        let message = match line {
            Ok(message) => message,
            Err(error) => {
                return CommandResult::failure("chat", "input", error.to_string(), 7);
            }
        };
        let message = message.trim();
        if message.is_empty() {
            continue;
        }
        if EXIT_WORDS.iter().any(|word| message.eq_ignore_ascii_case(word)) {
            break;
        }

        let reply = runtime.block_on(
            orchestrator.handle_message_isolated(message.to_string(), session_id.clone()),
        );
        turns += 1;
        if let Err(error) = writeln!(output, "assistant> {reply}\n") {
            return CommandResult::failure("chat", "output", error.to_string(), 7);
        }
    }

    CommandResult::success(
        "chat",
        format!("conversation `{session_id}` ended after {turns} turn(s)"),
    )
}
