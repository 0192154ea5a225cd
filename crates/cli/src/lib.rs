pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "quotedesk",
    about = "Quotedesk operator CLI",
    long_about = "Inspect Quotedesk configuration, check runtime readiness, and read stored quote requests.",
    after_help = "Examples:\n  quotedesk doctor --json\n  quotedesk config\n  quotedesk quotes --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, data storage, and notification readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print stored quote requests as JSON, newest first")]
    Quotes {
        #[arg(long, help = "Print at most this many quote requests")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Quotes { limit } => commands::quotes::run(limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
