//! Live E2E harness entry point
//!
//! Runs the built-in scenario catalog against a running booking app.
//! Skipped unless BOOKING_E2E_BASE_URL is set:
//!
//!   BOOKING_E2E_BASE_URL=http://localhost:5500 cargo test --package booking-e2e --test e2e

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use booking_e2e::{app, catalog, E2eResult, RunnerConfig, ScenarioRunner, ScenarioStatus};

#[derive(Parser, Debug)]
#[command(name = "booking-e2e-harness")]
#[command(about = "Live scenario run against the booking app")]
#[command(ignore_errors = true)]
struct Args {
    /// Base URL of the running app; the harness is skipped when unset
    #[arg(long, env = "BOOKING_E2E_BASE_URL")]
    base_url: Option<String>,

    /// Run only scenarios with this tag
    #[arg(long, env = "BOOKING_E2E_TAG")]
    tag: Option<String>,

    /// Scenarios running at once
    #[arg(long, env = "BOOKING_E2E_CONCURRENCY", default_value = "1")]
    concurrency: usize,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let Some(base_url) = args.base_url.clone() else {
        println!("BOOKING_E2E_BASE_URL not set; skipping live scenarios");
        return;
    };

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    match rt.block_on(async_main(args, base_url)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args, base_url: String) -> E2eResult<bool> {
    let mut config = RunnerConfig {
        base_url,
        concurrency: args.concurrency,
        output_dir: args.output,
        ..Default::default()
    };
    config.browser.headless = !args.headed;
    config.validate()?;

    app::wait_until_ready(&config.base_url, config.app.ready_timeout()).await?;

    let mut scenarios = catalog::builtin()?;
    if let Some(tag) = &args.tag {
        scenarios.retain(|s| s.has_tag(tag));
    }

    let runner = ScenarioRunner::new(config);
    let suite = runner.run_suite(&scenarios).await?;
    runner.write_results(&suite)?;

    for result in &suite.results {
        let mark = match result.status {
            ScenarioStatus::Passed => "PASS",
            ScenarioStatus::Failed => "FAIL",
            ScenarioStatus::KnownDefect => "KNOWN",
        };
        println!("{:5} {:6} {}", mark, result.id, result.summary());
    }

    Ok(suite.success())
}
