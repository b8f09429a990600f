pub mod commands;
pub mod eval;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "brewbot",
    about = "BrewBot operator CLI",
    long_about = "Evaluate a running BrewBot server, inspect configuration, and check readiness.",
    after_help = "Examples:\n  brewbot eval --base-url http://localhost:8000\n  brewbot doctor --json\n  brewbot config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the golden dataset against a running server and grade the replies")]
    Eval {
        #[arg(long, help = "Server base URL (overrides eval.base_url)")]
        base_url: Option<String>,
        #[arg(long, help = "Path to the golden dataset JSON (overrides eval.dataset_path)")]
        dataset: Option<PathBuf>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, backstop rule compilation, and dataset readability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Eval { base_url, dataset, json } => {
            commands::eval::run(commands::eval::EvalArgs { base_url, dataset, json })
        }
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
