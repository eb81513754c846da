pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "formwork",
    about = "Formwork operator CLI",
    long_about = "Inspect intake-relay configuration, run readiness checks, and push test submissions.",
    after_help = "Examples:\n  formwork doctor --json\n  formwork config\n  formwork submit --input request.toml --dry-run"
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
    #[command(about = "Validate config, provider credentials, and the resolved delivery route")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate an intake file and deliver it through the configured relay")]
    Submit {
        #[arg(long, help = "TOML file holding the submission record")]
        input: PathBuf,
        #[arg(long, help = "Validate and print the flattened payload without delivering")]
        dry_run: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Submit { input, dry_run } => commands::submit::run(&input, dry_run),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
