pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use tally_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    about = "Tally basket pricing CLI",
    long_about = "Price shopping baskets against a product catalogue with tiered delivery charges and promotional offers.",
    after_help = "Examples:\n  tally price R01 R01 G01\n  tally price --json B01 G01\n  tally config\n  tally check --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a basket of product codes and print the breakdown")]
    Price {
        #[arg(required = true, help = "Product codes to add, in insertion order")]
        codes: Vec<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect the effective catalogue, delivery tiers, and offers")]
    Config,
    #[command(about = "Validate the effective configuration and report per-check status")]
    Check {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn init_logging() {
    use tracing::Level;

    // Logging is best-effort here; a broken config is reported by the
    // command itself, on stdout.
    let Ok(config) = AppConfig::load(LoadOptions::default()) else {
        return;
    };

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Price { codes, json } => commands::price::run(&codes, json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Check { json } => {
            commands::CommandResult { exit_code: 0, output: commands::check::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
