//! Scenario runner: one browser session per scenario, steps then assertions

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::locator::{Locator, PageMap};
use crate::playwright::PlaywrightLauncher;
use crate::scenario::{Assertion, Scenario, Step, WaitState};
use crate::session::{BrowserLauncher, BrowserSession};

/// Outcome of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// Failed, but the scenario documents a defect the app is known to have
    KnownDefect,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::KnownDefect => "known-defect",
        }
    }
}

/// Where in a scenario a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Launch,
    Start,
    Step,
    Assertion,
}

/// The first failure of a scenario; execution stops there
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub phase: Phase,
    /// Index of the step or assertion, absent for launch/start
    pub index: Option<usize>,
    pub label: String,
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    fn new(phase: Phase, index: Option<usize>, label: String, err: &E2eError) -> Self {
        Self {
            phase,
            index,
            label,
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub label: String,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionRecord {
    pub index: usize,
    pub label: String,
    pub passed: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub id: String,
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
    pub assertions: Vec<AssertionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_defect: Option<String>,
}

impl ScenarioResult {
    fn pending(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id.clone(),
            name: scenario.name.clone(),
            status: ScenarioStatus::Passed,
            duration_ms: 0,
            steps: Vec::new(),
            assertions: Vec::new(),
            failure: None,
            screenshot: None,
            known_defect: scenario.known_defect.clone(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Short failure summary for tables and logs
    pub fn summary(&self) -> String {
        match &self.failure {
            Some(f) => format!("{} [{}]: {}", f.label, f.kind.as_str(), f.message),
            None => String::new(),
        }
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub known_defects: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    fn collect(
        started_at: DateTime<Utc>,
        base_url: &str,
        duration_ms: u64,
        results: Vec<ScenarioResult>,
    ) -> Self {
        let count = |status: ScenarioStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            started_at,
            base_url: base_url.to_string(),
            total: results.len(),
            passed: count(ScenarioStatus::Passed),
            failed: count(ScenarioStatus::Failed),
            known_defects: count(ScenarioStatus::KnownDefect),
            duration_ms,
            results,
        }
    }

    /// True when no scenario failed; known defects do not count
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs scenarios against the configured application
pub struct ScenarioRunner {
    config: RunnerConfig,
    launcher: Arc<dyn BrowserLauncher>,
    pages: PageMap,
}

impl ScenarioRunner {
    /// Runner driving Playwright
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_launcher(config, Arc::new(PlaywrightLauncher::new()))
    }

    pub fn with_launcher(config: RunnerConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let pages = config.page_map();
        Self {
            config,
            launcher,
            pages,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn pages(&self) -> &PageMap {
        &self.pages
    }

    /// Run scenarios, up to `concurrency` at once. Results keep input order.
    pub async fn run_suite(&self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        Scenario::ensure_unique_ids(scenarios)?;
        let prepared = scenarios
            .iter()
            .map(|s| self.prepare(s))
            .collect::<E2eResult<Vec<_>>>()?;

        let started_at = Utc::now();
        let start = Instant::now();
        let concurrency = self.config.concurrency.max(1);

        info!(
            "Running {} scenario(s) against {} (concurrency {})",
            prepared.len(),
            self.config.base_url,
            concurrency
        );

        let results: Vec<ScenarioResult> = stream::iter(prepared.iter())
            .map(|scenario| self.execute(scenario))
            .buffered(concurrency)
            .collect()
            .await;

        let suite = SuiteResult::collect(
            started_at,
            &self.config.base_url,
            start.elapsed().as_millis() as u64,
            results,
        );

        info!(
            "Scenario results: {} passed, {} failed, {} known defect(s) ({} ms)",
            suite.passed, suite.failed, suite.known_defects, suite.duration_ms
        );
        Ok(suite)
    }

    /// Run one scenario in a fresh session
    pub async fn run_scenario(&self, scenario: &Scenario) -> E2eResult<ScenarioResult> {
        let prepared = self.prepare(scenario)?;
        Ok(self.execute(&prepared).await)
    }

    /// Write suite results to `<output_dir>/test-results.json`
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }

    fn prepare(&self, scenario: &Scenario) -> E2eResult<Scenario> {
        scenario.validate(&self.pages)?;
        scenario.resolved(&self.pages)
    }

    async fn execute(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        let mut result = ScenarioResult::pending(scenario);
        debug!("Running scenario {}: {}", scenario.id, scenario.name);

        match self.launcher.launch(&self.config).await {
            Ok(mut session) => {
                result.failure = self.drive(session.as_mut(), scenario, &mut result).await;

                if result.failure.is_some() && self.config.screenshot_on_failure {
                    let path = self
                        .config
                        .screenshot_dir()
                        .join(format!("{}.png", scenario.id));
                    match session.screenshot(&path).await {
                        Ok(()) => result.screenshot = Some(path),
                        Err(e) => warn!("{}: failure screenshot not captured: {}", scenario.id, e),
                    }
                }

                if let Err(e) = session.close().await {
                    warn!("{}: closing browser session failed: {}", scenario.id, e);
                }
            }
            Err(e) => {
                result.failure = Some(Failure::new(Phase::Launch, None, "launch".into(), &e));
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result.status = match (&result.failure, &scenario.known_defect) {
            (None, None) => ScenarioStatus::Passed,
            (None, Some(_)) => {
                warn!(
                    "{} passed although it is marked as a known defect; the app may have been fixed",
                    scenario.id
                );
                ScenarioStatus::Passed
            }
            // Only a page mismatch is the documented defect
            (Some(failure), Some(_)) if failure.kind == FailureKind::Assertion => {
                ScenarioStatus::KnownDefect
            }
            (Some(_), _) => ScenarioStatus::Failed,
        };

        match result.status {
            ScenarioStatus::Passed => info!("✓ {} {} ({} ms)", result.id, result.name, result.duration_ms),
            ScenarioStatus::KnownDefect => {
                info!("~ {} {} - known defect: {}", result.id, result.name, result.summary())
            }
            ScenarioStatus::Failed => error!("✗ {} {} - {}", result.id, result.name, result.summary()),
        }
        result
    }

    /// Start page, steps, assertions; returns the first failure
    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        scenario: &Scenario,
        result: &mut ScenarioResult,
    ) -> Option<Failure> {
        let start_url = self.config.url_for(&scenario.start);
        if let Err(e) = session.goto(&start_url, self.config.timeouts.navigation()).await {
            return Some(Failure::new(Phase::Start, None, format!("start:{}", scenario.start), &e));
        }

        for (index, step) in scenario.steps.iter().enumerate() {
            let label = step.label();
            debug!("{} step {}: {}", scenario.id, index, label);

            let began = Instant::now();
            let outcome = self.run_step(session, step).await;
            result.steps.push(StepRecord {
                index,
                label: label.clone(),
                success: outcome.is_ok(),
                duration_ms: began.elapsed().as_millis() as u64,
                error: outcome.as_ref().err().map(|e| e.to_string()),
            });

            if let Err(e) = outcome {
                return Some(Failure::new(Phase::Step, Some(index), label, &e));
            }
        }

        for (index, assertion) in scenario.assertions.iter().enumerate() {
            let label = assertion.label();
            debug!("{} assertion {}: {}", scenario.id, index, label);

            let began = Instant::now();
            let outcome = self.check(session, assertion).await;
            result.assertions.push(AssertionRecord {
                index,
                label: label.clone(),
                passed: outcome.is_ok(),
                duration_ms: began.elapsed().as_millis() as u64,
                message: outcome.as_ref().err().map(|e| e.to_string()),
            });

            if let Err(e) = outcome {
                return Some(Failure::new(Phase::Assertion, Some(index), label, &e));
            }
        }

        None
    }

    async fn settle(&self) {
        let delay = self.config.settle();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    async fn run_step(&self, session: &mut dyn BrowserSession, step: &Step) -> E2eResult<()> {
        let timeouts = &self.config.timeouts;
        match step {
            Step::Navigate { url } => {
                session
                    .goto(&self.config.url_for(url), timeouts.navigation())
                    .await
            }
            Step::Fill { locator, value } => {
                self.settle().await;
                session.fill(locator, value, timeouts.action()).await
            }
            Step::Click { locator } => {
                self.settle().await;
                session.click(locator, timeouts.action()).await
            }
            Step::WaitForUrl { contains, timeout_ms } => {
                let window = timeout_ms.map(Duration::from_millis).unwrap_or(timeouts.navigation());
                match self.poll_url(session, contains, window).await? {
                    UrlPoll::Seen(_) => Ok(()),
                    UrlPoll::Missed(last) => Err(E2eError::Timeout(format!(
                        "URL containing '{}' after {} ms (at {})",
                        contains,
                        window.as_millis(),
                        last
                    ))),
                }
            }
            Step::Wait {
                locator,
                state,
                timeout_ms,
            } => {
                let window = timeout_ms.map(Duration::from_millis).unwrap_or(timeouts.action());
                session.wait_for(locator, *state, window).await
            }
        }
    }

    async fn check(&self, session: &mut dyn BrowserSession, assertion: &Assertion) -> E2eResult<()> {
        let window = |timeout_ms: &Option<u64>| {
            timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(self.config.timeouts.assertion())
        };

        match assertion {
            Assertion::UrlContains { value, timeout_ms } => {
                match self.poll_url(session, value, window(timeout_ms)).await? {
                    UrlPoll::Seen(_) => Ok(()),
                    UrlPoll::Missed(last) => Err(E2eError::AssertionFailed(format!(
                        "expected URL containing '{}', got '{}'",
                        value, last
                    ))),
                }
            }
            Assertion::UrlNotContains { value, timeout_ms } => {
                match self.poll_url(session, value, window(timeout_ms)).await? {
                    UrlPoll::Seen(url) => Err(E2eError::AssertionFailed(format!(
                        "URL '{}' should not contain '{}'",
                        url, value
                    ))),
                    UrlPoll::Missed(_) => Ok(()),
                }
            }
            Assertion::TextVisible {
                text,
                locator: Some(locator),
                timeout_ms,
            } => self.expect_text_in(session, locator, text, window(timeout_ms)).await,
            Assertion::TextVisible {
                text,
                locator: None,
                timeout_ms,
            } => {
                let target = Locator::text(text);
                match session.wait_for(&target, WaitState::Visible, window(timeout_ms)).await {
                    Err(e) if is_wait_miss(&e) => Err(E2eError::AssertionFailed(format!(
                        "text '{}' not visible on page",
                        text
                    ))),
                    other => other,
                }
            }
            Assertion::TextHidden { text, timeout_ms } => {
                let target = Locator::text(text);
                match session.wait_for(&target, WaitState::Hidden, window(timeout_ms)).await {
                    Err(e) if is_wait_miss(&e) => Err(E2eError::AssertionFailed(format!(
                        "text '{}' is still visible",
                        text
                    ))),
                    other => other,
                }
            }
            Assertion::Visible { locator } => {
                if session.is_visible(locator).await? {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!("{} is not visible", locator)))
                }
            }
            Assertion::AnyContains {
                text,
                candidates,
                timeout_ms,
            } => {
                let deadline = Instant::now() + window(timeout_ms);
                loop {
                    if let Some(found) = search_candidates(session, candidates, text).await {
                        debug!("'{}' found in {}", text, found);
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        return Err(E2eError::AssertionFailed(format!(
                            "validation message '{}' not found on page; feature may be missing",
                            text
                        )));
                    }
                    sleep(self.config.timeouts.poll()).await;
                }
            }
        }
    }

    /// Wait for `locator` to be visible, then for its text to contain `text`
    async fn expect_text_in(
        &self,
        session: &mut dyn BrowserSession,
        locator: &Locator,
        text: &str,
        window: Duration,
    ) -> E2eResult<()> {
        let deadline = Instant::now() + window;
        match session.wait_for(locator, WaitState::Visible, window).await {
            Err(e) if is_wait_miss(&e) => {
                return Err(E2eError::AssertionFailed(format!(
                    "{} not visible, expected it to show '{}'",
                    locator, text
                )))
            }
            other => other?,
        }

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let shown = match session.inner_text(locator, remaining.max(self.config.timeouts.poll())).await {
                Ok(shown) => shown,
                Err(e) if is_wait_miss(&e) => String::new(),
                Err(e) => return Err(e),
            };
            if shown.contains(text) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "{} shows '{}', expected it to contain '{}'",
                    locator,
                    shown.trim(),
                    text
                )));
            }
            sleep(self.config.timeouts.poll()).await;
        }
    }

    /// Poll the current URL until it contains `needle` or the window closes
    async fn poll_url(
        &self,
        session: &mut dyn BrowserSession,
        needle: &str,
        window: Duration,
    ) -> E2eResult<UrlPoll> {
        let deadline = Instant::now() + window;
        loop {
            let url = session.current_url().await?;
            if url.contains(needle) {
                return Ok(UrlPoll::Seen(url));
            }
            if Instant::now() >= deadline {
                return Ok(UrlPoll::Missed(url));
            }
            sleep(self.config.timeouts.poll()).await;
        }
    }
}

enum UrlPoll {
    Seen(String),
    Missed(String),
}

/// A bounded wait that ran out, as opposed to a broken session
fn is_wait_miss(err: &E2eError) -> bool {
    matches!(err, E2eError::Timeout(_) | E2eError::ElementNotFound { .. })
}

/// Linear search: the `value` attribute, then the text content, of each
/// candidate. Lookup errors on a candidate are skipped.
async fn search_candidates(
    session: &mut dyn BrowserSession,
    candidates: &[Locator],
    text: &str,
) -> Option<String> {
    let needle = text.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&needle);

    for candidate in candidates {
        match session.attribute(candidate, "value").await {
            Ok(Some(value)) if hit(&value) => return Some(candidate.to_string()),
            Ok(_) => {}
            Err(e) => debug!("candidate {} value: {}", candidate, e),
        }
        match session.text_content(candidate).await {
            Ok(Some(content)) if hit(&content) => return Some(candidate.to_string()),
            Ok(_) => {}
            Err(e) => debug!("candidate {} text: {}", candidate, e),
        }
    }
    None
}
