pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tripcover",
    about = "Tripcover operator CLI",
    long_about = "Inspect configuration, price a trip payload, or hold a local quote conversation.",
    after_help = "Examples:\n  tripcover config\n  tripcover quote --payload trip.json\n  tripcover chat"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Request quotes for a JSON trip payload and print the plan comparison")]
    Quote {
        #[arg(long, help = "Path to the JSON payload forwarded to the quotation service")]
        payload: PathBuf,
    },
    #[command(about = "Chat with the quote assistant on stdin; type 'exit' to stop")]
    Chat {
        #[arg(long, help = "Reuse a session id instead of generating one")]
        session: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Quote { payload } => commands::quote::run(&payload),
        Command::Chat { session } => commands::chat::run(session),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
