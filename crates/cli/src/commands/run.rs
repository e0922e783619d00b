//! Run Command

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use booking_e2e::config::{Engine, RunnerConfig};
use booking_e2e::{catalog, AppHandle, ScenarioResult, ScenarioRunner, ScenarioStatus, SuiteResult};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use super::Context;
use crate::output::{print_document, print_info, print_list, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Run only these scenario IDs (repeatable), in the given order
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Run only scenarios with this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Load scenarios from this directory instead of the built-in catalog
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Scenarios running at once, each in its own browser
    #[arg(short = 'j', long, env = "BOOKING_E2E_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Pause before every fill/click, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, value_name = "ENGINE")]
    pub browser: Option<Engine>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Output directory for results and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not capture screenshots of failed scenarios
    #[arg(long)]
    pub no_screenshots: bool,

    /// Do not wait for the app before running
    #[arg(long)]
    pub skip_probe: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut RunnerConfig) {
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(ms) = self.settle_ms {
            config.settle_ms = ms;
        }
        if let Some(engine) = self.browser {
            config.browser.engine = engine;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.clone();
        }
        if self.no_screenshots {
            config.screenshot_on_failure = false;
        }
        if self.skip_probe {
            config.app.probe = false;
        }
        if let Some(dir) = &self.scenarios {
            config.scenarios_dir = Some(dir.clone());
        }
    }
}

/// Scenario result display wrapper for serialization
#[derive(Serialize)]
pub struct ResultDisplay {
    pub id: String,
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub detail: String,
}

impl From<&ScenarioResult> for ResultDisplay {
    fn from(r: &ScenarioResult) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            status: r.status,
            duration_ms: r.duration_ms,
            detail: r.summary(),
        }
    }
}

impl TableDisplay for ResultDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Scenario", "Status", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        let status = match self.status {
            ScenarioStatus::Passed => "✓ passed".green().to_string(),
            ScenarioStatus::Failed => "✗ failed".red().to_string(),
            ScenarioStatus::KnownDefect => "~ known defect".yellow().to_string(),
        };
        vec![
            self.id.clone(),
            self.name.clone(),
            status,
            format!("{}ms", self.duration_ms),
            self.detail.clone(),
        ]
    }
}

pub async fn execute(args: RunArgs, mut ctx: Context) -> Result<bool> {
    args.apply(&mut ctx.config);
    ctx.config.validate()?;

    let mut scenarios = ctx.scenarios(None)?;
    if let Some(tag) = &args.tag {
        scenarios.retain(|s| s.has_tag(tag));
    }
    let scenarios = catalog::select(scenarios, &args.ids)?;

    if scenarios.is_empty() {
        print_warning("No scenarios matched");
        return Ok(true);
    }

    let Context { config, format } = ctx;
    let app = AppHandle::start(&config)
        .await
        .context("application under test is not ready")?;
    if app.spawned() {
        info!("Application started for this run");
    }

    let runner = ScenarioRunner::new(config);
    let suite = runner.run_suite(&scenarios).await?;
    let path = runner.write_results(&suite)?;
    drop(app);

    report(&suite, format);
    if format.is_human() {
        print_info(&format!("Results written to {}", path.display()));
    }

    Ok(suite.success())
}

fn report(suite: &SuiteResult, format: OutputFormat) {
    if !format.is_human() {
        print_document(suite, format);
        return;
    }

    let displays: Vec<ResultDisplay> = suite.results.iter().map(ResultDisplay::from).collect();
    print_list(&displays, format);

    let line = format!(
        "{} passed, {} failed, {} known defect(s) in {} ms",
        suite.passed, suite.failed, suite.known_defects, suite.duration_ms
    );
    if suite.success() {
        print_success(&line);
    } else {
        print_warning(&line);
    }
}
