//! Booking E2E CLI - Main Entry Point
//!
//! Runs, lists and inspects the booking app's browser scenarios.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, config, list, run, show, Context};

/// Browser scenarios for the appointment booking web app
#[derive(Parser)]
#[command(name = "booking-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "BOOKING_E2E_CONFIG", default_value = "booking-e2e.toml", global = true)]
    config: PathBuf,

    /// Base URL of the app under test (overrides the config file)
    #[arg(long, env = "BOOKING_E2E_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios in the browser
    Run(run::RunArgs),

    /// List available scenarios
    List(list::ListArgs),

    /// Show one scenario with locators resolved
    Show(show::ShowArgs),

    /// Check the app and the browser toolchain are reachable
    Check,

    /// Print the effective configuration
    Config,
}

/// Nothing failed
const EXIT_OK: u8 = 0;
/// At least one scenario failed
const EXIT_FAILED: u8 = 1;
/// The harness itself could not run
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let outcome = match Context::load(&cli.config, cli.base_url.as_deref(), cli.format) {
        Ok(ctx) => match cli.command {
            Commands::Run(args) => run::execute(args, ctx).await,
            Commands::List(args) => list::execute(args, ctx).map(|_| true),
            Commands::Show(args) => show::execute(args, ctx).map(|_| true),
            Commands::Check => check::execute(ctx).await,
            Commands::Config => config::execute(ctx).map(|_| true),
        },
        Err(e) => Err(e),
    };

    match outcome {
        Ok(true) => ExitCode::from(EXIT_OK),
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
