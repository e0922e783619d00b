//! Runner behaviour against an in-memory browser

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use booking_e2e::catalog;
use booking_e2e::runner::Phase;
use booking_e2e::scenario::WaitState;
use booking_e2e::{
    BrowserLauncher, BrowserSession, E2eError, E2eResult, FailureKind, Locator, PageMap,
    RunnerConfig, Scenario, ScenarioRunner, ScenarioStatus,
};

const BASE: &str = "http://app.test";

#[derive(Debug, Clone, Default)]
struct Element {
    visible: bool,
    text: String,
    value: Option<String>,
}

/// What the fake app looks like; shared by every session
#[derive(Default)]
struct FakeApp {
    elements: HashMap<String, Element>,
    /// Lookups on these selectors fail like a detached node
    broken: HashSet<String>,
    /// Clicking a selector navigates to a path
    clicks: HashMap<String, String>,
    /// Server-side redirects, path to path
    redirects: HashMap<String, String>,
    /// Slow page loads, by path
    delays: HashMap<String, u64>,
    fail_launch: bool,
}

impl FakeApp {
    fn with(mut self, alias: &str, element: Element) -> Self {
        self.elements.insert(selector(alias), element);
        self
    }
}

#[derive(Default)]
struct Stats {
    launched: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    actions: Mutex<Vec<String>>,
    screenshots: Mutex<Vec<PathBuf>>,
}

impl Stats {
    fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }
}

struct FakeLauncher {
    app: Arc<FakeApp>,
    stats: Arc<Stats>,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, _config: &RunnerConfig) -> E2eResult<Box<dyn BrowserSession>> {
        if self.app.fail_launch {
            return Err(E2eError::PlaywrightNotFound("node: not found".into()));
        }
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            app: self.app.clone(),
            stats: self.stats.clone(),
            url: "about:blank".into(),
        }))
    }
}

struct FakeSession {
    app: Arc<FakeApp>,
    stats: Arc<Stats>,
    url: String,
}

impl FakeSession {
    fn lookup(&self, locator: &Locator) -> E2eResult<Option<Element>> {
        let key = locator.to_string();
        if self.app.broken.contains(&key) {
            return Err(E2eError::Browser(format!("{} is detached", key)));
        }
        Ok(match locator {
            Locator::Text(text) => {
                let needle = text.to_lowercase();
                self.app
                    .elements
                    .values()
                    .find(|e| e.visible && e.text.to_lowercase().contains(&needle))
                    .cloned()
            }
            _ => self.app.elements.get(&key).cloned(),
        })
    }

    fn require(&self, locator: &Locator) -> E2eResult<Element> {
        self.lookup(locator)?.ok_or_else(|| E2eError::ElementNotFound {
            selector: locator.to_string(),
        })
    }

    fn record(&self, action: String) {
        self.stats.actions.lock().unwrap().push(action);
    }

    async fn open(&mut self, path: &str) {
        if let Some(ms) = self.app.delays.get(path) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        let path = self.app.redirects.get(path).map(String::as_str).unwrap_or(path);
        self.url = format!("{}{}", BASE, path);
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> E2eResult<()> {
        self.record(format!("goto {}", url));
        let path = url.strip_prefix(BASE).unwrap_or(url).to_string();
        self.open(&path).await;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str, _timeout: Duration) -> E2eResult<()> {
        self.require(locator)?;
        self.record(format!("fill {} {}", locator, value));
        Ok(())
    }

    async fn click(&mut self, locator: &Locator, _timeout: Duration) -> E2eResult<()> {
        self.require(locator)?;
        self.record(format!("click {}", locator));
        if let Some(path) = self.app.clicks.get(&locator.to_string()).cloned() {
            self.open(&path).await;
        }
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, state: WaitState, _timeout: Duration) -> E2eResult<()> {
        let element = self.lookup(locator)?;
        let reached = match state {
            WaitState::Visible => element.map(|e| e.visible).unwrap_or(false),
            WaitState::Hidden => !element.map(|e| e.visible).unwrap_or(false),
            WaitState::Attached => element.is_some(),
            WaitState::Detached => element.is_none(),
        };
        if reached {
            Ok(())
        } else {
            Err(E2eError::Timeout(format!("{} to be {}", locator, state.as_str())))
        }
    }

    async fn current_url(&mut self) -> E2eResult<String> {
        Ok(self.url.clone())
    }

    async fn is_visible(&mut self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.lookup(locator)?.map(|e| e.visible).unwrap_or(false))
    }

    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        Ok(self.lookup(locator)?.map(|e| e.text))
    }

    async fn inner_text(&mut self, locator: &Locator, _timeout: Duration) -> E2eResult<String> {
        Ok(self.require(locator)?.text)
    }

    async fn attribute(&mut self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        if name != "value" {
            return Ok(None);
        }
        Ok(self.lookup(locator)?.and_then(|e| e.value))
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        self.stats.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(self: Box<Self>) -> E2eResult<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn selector(alias: &str) -> String {
    PageMap::default()
        .get(alias)
        .unwrap_or_else(|| panic!("no alias {}", alias))
        .to_string()
}

fn shown(text: &str) -> Element {
    Element {
        visible: true,
        text: text.to_string(),
        value: None,
    }
}

fn field() -> Element {
    Element {
        visible: true,
        text: String::new(),
        value: Some(String::new()),
    }
}

/// Login page, sign-up form and a student account
fn booking_app() -> FakeApp {
    let mut app = FakeApp::default()
        .with("login.email", field())
        .with("login.password", field())
        .with("login.submit", shown("Sign In"))
        .with("login.signup_link", shown("Sign up"))
        .with("signup.university_id", field())
        .with("signup.email", field())
        .with("signup.password", field())
        .with("signup.role_group", shown("Student Professor"))
        .with("signup.role_student_label", shown("Student"))
        .with("signup.role_student", shown(""))
        .with("signup.role_professor_label", shown("Professor"))
        .with("signup.role_professor", shown(""));

    app.clicks.insert(selector("login.submit"), "/student/dashboard".into());
    app.redirects
        .insert("/professor/dashboard".into(), "/student/dashboard".into());
    app
}

fn test_config(dir: &Path) -> RunnerConfig {
    let mut config = RunnerConfig {
        base_url: BASE.to_string(),
        output_dir: dir.to_path_buf(),
        ..Default::default()
    };
    config.timeouts.assertion_ms = 200;
    config.timeouts.navigation_ms = 200;
    config.timeouts.poll_ms = 10;
    config
}

fn runner(app: FakeApp, config: RunnerConfig) -> (ScenarioRunner, Arc<Stats>) {
    let stats = Arc::new(Stats::default());
    let launcher = FakeLauncher {
        app: Arc::new(app),
        stats: stats.clone(),
    };
    (ScenarioRunner::with_launcher(config, Arc::new(launcher)), stats)
}

fn builtin(id: &str) -> Scenario {
    catalog::select(catalog::builtin().unwrap(), &[id.to_string()])
        .unwrap()
        .remove(0)
}

#[tokio::test]
async fn test_access_denied_flow_passes() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app().with("notifications", shown("Access denied: professors only"));
    let (runner, stats) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC010")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Passed, "{}", result.summary());
    assert!(result.failure.is_none());
    assert_eq!(result.steps.len(), 5);
    assert!(result.steps.iter().all(|s| s.success));
    assert_eq!(result.assertions.len(), 2);
    assert_eq!(stats.launched.load(Ordering::SeqCst), 1);
    assert_eq!(stats.closed.load(Ordering::SeqCst), 1);

    let actions = stats.actions();
    assert_eq!(actions[0], "goto http://app.test/");
    assert!(actions.contains(&"goto http://app.test/professor/dashboard".to_string()));
    assert!(stats.screenshots.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_step_failure_stops_scenario() {
    let dir = tempfile::tempdir().unwrap();
    // No full name field on the sign-up form
    let (runner, stats) = runner(booking_app(), test_config(dir.path()));

    let scenario = Scenario::from_yaml(
        r#"
id: FLOW1
name: missing field
steps:
  - action: click
    locator: "@login.signup_link"
  - action: fill
    locator: "css=#full-name"
    value: Test Student One
  - action: click
    locator: "@signup.submit"
assertions:
  - expect: url_contains
    value: /student/dashboard
"#,
    )
    .unwrap();

    let result = runner.run_scenario(&scenario).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.phase, Phase::Step);
    assert_eq!(failure.index, Some(1));
    assert_eq!(failure.kind, FailureKind::Infrastructure);
    assert!(failure.message.contains("css=#full-name"));

    assert_eq!(result.steps.len(), 2);
    assert!(!result.steps[1].success);
    assert!(result.assertions.is_empty());
    assert!(!stats.actions().iter().any(|a| a.contains("button")));

    assert_eq!(stats.closed.load(Ordering::SeqCst), 1);
    assert_eq!(
        result.screenshot.as_deref(),
        Some(dir.path().join("screenshots").join("FLOW1.png").as_path())
    );
}

#[tokio::test]
async fn test_missing_validation_message_is_assertion_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app().with("signup.full_name", field());
    let (runner, stats) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC005")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure
        .message
        .contains("validation message 'invalid email' not found on page; feature may be missing"));
    assert_eq!(stats.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_any_contains_skips_broken_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = booking_app().with("signup.full_name", field());
    app.broken.insert(selector("signup.university_id"));
    app.elements.insert(
        selector("signup.email"),
        Element {
            visible: true,
            text: String::new(),
            value: Some("Invalid Email address".into()),
        },
    );
    let (runner, _) = runner(app, test_config(dir.path()));

    let scenario = Scenario::from_yaml(
        r#"
id: FLOW2
name: candidate search
assertions:
  - expect: any_contains
    text: invalid email
    candidates:
      - "@signup.university_id"
      - "@signup.password"
      - "@signup.email"
"#,
    )
    .unwrap();

    let result = runner.run_scenario(&scenario).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Passed, "{}", result.summary());
}

#[tokio::test]
async fn test_known_defect_does_not_fail_suite() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app().with("signup.full_name", field());
    let (runner, _) = runner(app, test_config(dir.path()));

    let suite = runner.run_suite(&[builtin("TC007")]).await.unwrap();

    let result = &suite.results[0];
    assert_eq!(result.status, ScenarioStatus::KnownDefect);
    // The role selector is shown; only the "required" message is missing
    assert!(result.assertions[..3].iter().all(|a| a.passed));
    assert!(!result.assertions[3].passed);
    assert_eq!(suite.known_defects, 1);
    assert!(suite.success());
}

#[tokio::test]
async fn test_booked_slot_flow() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = booking_app();
    app.elements
        .insert("css=.booking-card".into(), shown("Your Booking: Mon 10:00"));
    app.elements.insert(
        "css=.slot-button".into(),
        Element {
            visible: false,
            text: "Confirm Booking".into(),
            value: None,
        },
    );
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC015")).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Passed, "{}", result.summary());
}

#[tokio::test]
async fn test_url_not_contains_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.timeouts.assertion_ms = 5000;
    let (runner, _) = runner(booking_app(), config);

    let scenario = Scenario::from_yaml(
        r#"
id: FLOW3
name: lands on dashboard
start: /student/dashboard
assertions:
  - expect: url_not_contains
    value: /dashboard
"#,
    )
    .unwrap();

    let result = runner.run_scenario(&scenario).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Failed);
    assert!(result.duration_ms < 2000);
    assert_eq!(result.failure.unwrap().kind, FailureKind::Assertion);
}

#[tokio::test]
async fn test_launch_failure_is_session_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = FakeApp {
        fail_launch: true,
        ..Default::default()
    };
    let (runner, stats) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC001")).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Launch);
    assert_eq!(failure.kind, FailureKind::Session);
    assert_eq!(stats.closed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_alias_aborts_before_launch() {
    let dir = tempfile::tempdir().unwrap();
    let (runner, stats) = runner(booking_app(), test_config(dir.path()));

    let scenario = Scenario::from_yaml(
        "id: FLOW4\nname: typo\nsteps:\n  - action: click\n    locator: \"@login.sumbit\"\n",
    )
    .unwrap();

    let err = runner.run_suite(&[scenario]).await.unwrap_err();
    assert!(matches!(err, E2eError::UnknownLocator(_)));
    assert_eq!(stats.launched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_parallel_suite_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.concurrency = 3;

    let mut app = booking_app();
    for (path, ms) in [("/a", 150), ("/b", 20), ("/c", 80), ("/d", 10)] {
        app.delays.insert(path.to_string(), ms);
    }
    let (runner, stats) = runner(app, config);

    let scenarios: Vec<Scenario> = ["a", "b", "c", "d"]
        .iter()
        .map(|name| {
            Scenario::from_yaml(&format!(
                "id: P{0}\nname: page {0}\nstart: /{0}\nassertions:\n  - expect: url_contains\n    value: /{0}\n",
                name
            ))
            .unwrap()
        })
        .collect();

    let suite = runner.run_suite(&scenarios).await.unwrap();

    let ids: Vec<_> = suite.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Pa", "Pb", "Pc", "Pd"]);
    assert_eq!(suite.passed, 4);
    assert!(stats.max_active.load(Ordering::SeqCst) > 1);
    assert!(stats.max_active.load(Ordering::SeqCst) <= 3);
    assert_eq!(stats.closed.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_settle_delay_applies_before_interactions() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.settle_ms = 40;
    let (runner, _) = runner(booking_app(), config);

    let scenario = Scenario::from_yaml(
        r#"
id: FLOW5
name: settle
steps:
  - action: fill
    locator: "@login.email"
    value: example@gmail.com
  - action: click
    locator: "@login.submit"
"#,
    )
    .unwrap();

    let result = runner.run_scenario(&scenario).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Passed);
    assert!(result.steps.iter().all(|s| s.duration_ms >= 40));
}

#[tokio::test]
async fn test_known_defect_marker_does_not_mask_launch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = FakeApp {
        fail_launch: true,
        ..Default::default()
    };
    let (runner, _) = runner(app, test_config(dir.path()));

    let suite = runner
        .run_suite(&[builtin("TC003"), builtin("TC007")])
        .await
        .unwrap();

    for result in &suite.results {
        assert_eq!(result.status, ScenarioStatus::Failed, "{}", result.id);
        assert_eq!(result.failure.as_ref().unwrap().kind, FailureKind::Session);
    }
    assert_eq!(suite.failed, 2);
    assert_eq!(suite.known_defects, 0);
    assert!(!suite.success());
}

#[tokio::test]
async fn test_known_defect_marker_does_not_mask_missing_element() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = booking_app().with("signup.full_name", field());
    app.elements.remove(&selector("signup.password"));
    let (runner, _) = runner(app, test_config(dir.path()));

    let suite = runner.run_suite(&[builtin("TC003")]).await.unwrap();

    let result = &suite.results[0];
    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.phase, Phase::Step);
    assert_eq!(failure.kind, FailureKind::Infrastructure);
    assert!(failure.message.contains("div[4]/input"));
    assert!(!suite.success());
}

#[tokio::test]
async fn test_missing_id_accepted_is_known_defect() {
    let dir = tempfile::tempdir().unwrap();
    // The form submits and lands on a dashboard despite the empty ID
    let app = booking_app().with("signup.full_name", field());
    let (runner, _) = runner(app, test_config(dir.path()));

    let suite = runner.run_suite(&[builtin("TC003")]).await.unwrap();

    let result = &suite.results[0];
    assert_eq!(result.status, ScenarioStatus::KnownDefect);
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.index, Some(0));
    assert!(suite.success());
}

#[tokio::test]
async fn test_student_signup_lands_on_student_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app().with("signup.full_name", field());
    let (runner, stats) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC002")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Passed, "{}", result.summary());
    let actions = stats.actions();
    assert!(actions.contains(&format!("click {}", selector("signup.role_student"))));
    assert!(actions.contains(&format!(
        "fill {} test.stud.one.260223@example.com",
        selector("signup.email")
    )));
}

#[tokio::test]
async fn test_professor_signup_on_wrong_dashboard_fails() {
    let dir = tempfile::tempdir().unwrap();
    // Submit lands on the student dashboard whatever role was chosen
    let app = booking_app().with("signup.full_name", field());
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC001")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure.message.contains("/professor/dashboard"));
    assert!(failure.message.contains("/student/dashboard"));
}

#[tokio::test]
async fn test_professor_signup_passes() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = booking_app().with("signup.full_name", field());
    app.clicks
        .insert(selector("signup.submit"), "/professor/dashboard".into());
    app.redirects.clear();
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC001")).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Passed, "{}", result.summary());
}

#[tokio::test]
async fn test_short_password_message_shown() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app()
        .with("signup.full_name", field())
        .with("notifications", shown("Password is too short"));
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC006")).await.unwrap();
    assert_eq!(result.status, ScenarioStatus::Passed, "{}", result.summary());
}

#[tokio::test]
async fn test_short_password_without_too_short_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app()
        .with("signup.full_name", field())
        .with("notifications", shown("Password must contain a symbol"));
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC006")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.index, Some(1));
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure.message.contains("too short"));
    assert!(result.assertions[0].passed);
}

#[tokio::test]
async fn test_access_denied_without_redirect_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = booking_app().with("notifications", shown("Access denied: professors only"));
    app.redirects.clear();
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC010")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.index, Some(1));
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure.message.contains("/professor/dashboard"));
}

#[tokio::test]
async fn test_access_denied_notification_missing_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = booking_app().with("notifications", shown("Welcome back"));
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC010")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.index, Some(0));
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure.message.contains("Welcome back"));
    assert!(failure.message.contains("Access denied"));
}

#[tokio::test]
async fn test_booked_slot_still_confirmable_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = booking_app();
    app.elements
        .insert("css=.booking-card".into(), shown("Your Booking: Mon 10:00"));
    app.elements
        .insert("css=.slot-button".into(), shown("Confirm Booking"));
    let (runner, _) = runner(app, test_config(dir.path()));

    let result = runner.run_scenario(&builtin("TC015")).await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    let failure = result.failure.unwrap();
    assert_eq!(failure.phase, Phase::Assertion);
    assert_eq!(failure.index, Some(2));
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert!(failure.message.contains("'Confirm Booking' is still visible"));
    assert!(result.assertions[..2].iter().all(|a| a.passed));
}
