//! Runner configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::locator::PageMap;

/// Default location of the application under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:5500";

/// Runner configuration, usually read from `booking-e2e.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL of the app; relative scenario URLs are joined onto it
    pub base_url: String,

    /// Scenarios running at once, each in its own browser
    pub concurrency: usize,

    /// Optional pause before every fill/click
    pub settle_ms: u64,

    /// Output directory for results and screenshots
    pub output_dir: PathBuf,

    /// Capture a page screenshot when a scenario fails
    pub screenshot_on_failure: bool,

    /// Load scenarios from here instead of the built-in catalog
    pub scenarios_dir: Option<PathBuf>,

    pub browser: BrowserConfig,

    pub timeouts: Timeouts,

    pub app: AppConfig,

    /// Page map entries overriding or extending the defaults
    #[serde(default = "PageMap::empty")]
    pub locators: PageMap,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 1,
            settle_ms: 0,
            output_dir: PathBuf::from("test-results"),
            screenshot_on_failure: true,
            scenarios_dir: None,
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            app: AppConfig::default(),
            locators: PageMap::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Chromium => "chromium",
            Engine::Firefox => "firefox",
            Engine::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Engine {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Engine::Chromium),
            "firefox" => Ok(Engine::Firefox),
            "webkit" => Ok(Engine::Webkit),
            other => Err(E2eError::InvalidConfig(format!("unknown browser engine '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub engine: Engine,
    pub headless: bool,
    /// Extra browser command-line arguments
    pub args: Vec<String>,
    /// Node.js executable running the bridge
    pub node_binary: PathBuf,
    /// Module specifier for Playwright, `playwright` by default
    pub playwright_module: Option<String>,
    /// Directory added to NODE_PATH so the bridge can find Playwright
    pub node_path: Option<PathBuf>,
    pub viewport: Viewport,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Chromium,
            headless: true,
            args: vec![
                "--window-size=1280,720".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--ipc=host".to_string(),
                "--single-process".to_string(),
            ],
            node_binary: PathBuf::from("node"),
            playwright_module: None,
            node_path: None,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
        }
    }
}

/// Bounded waits, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Actionability wait for fill/click, and the context default
    pub action_ms: u64,
    pub navigation_ms: u64,
    /// Default window for assertions that poll
    pub assertion_ms: u64,
    pub launch_ms: u64,
    pub close_ms: u64,
    /// Interval between polls of URL or candidate elements
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 5000,
            navigation_ms: 10000,
            assertion_ms: 5000,
            launch_ms: 30000,
            close_ms: 5000,
            poll_ms: 100,
        }
    }
}

impl Timeouts {
    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    pub fn launch(&self) -> Duration {
        Duration::from_millis(self.launch_ms)
    }

    pub fn close(&self) -> Duration {
        Duration::from_millis(self.close_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(10))
    }
}

/// How to reach (and optionally start) the app under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Command that serves the app; empty when it is already running
    pub command: Vec<String>,

    /// Working directory for `command`
    pub workdir: Option<PathBuf>,

    /// Probe the base URL before running scenarios
    pub probe: bool,

    pub ready_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            workdir: None,
            probe: true,
            ready_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl RunnerConfig {
    /// Load configuration from file, or defaults when it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> E2eResult<String> {
        toml::to_string_pretty(self).map_err(|e| E2eError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::InvalidConfig(format!(
                "base_url must be http(s): {}",
                self.base_url
            )));
        }
        if self.concurrency == 0 {
            return Err(E2eError::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.browser.viewport.width == 0 || self.browser.viewport.height == 0 {
            return Err(E2eError::InvalidConfig("viewport must be non-empty".into()));
        }
        Ok(())
    }

    /// Default page map with the config's overrides applied
    pub fn page_map(&self) -> PageMap {
        let mut pages = PageMap::default();
        pages.merge(&self.locators);
        pages
    }

    /// Join a scenario URL onto the base URL; absolute URLs pass through
    pub fn url_for(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if target.is_empty() {
            return format!("{}/", base);
        }
        if target.starts_with('/') {
            format!("{}{}", base, target)
        } else {
            format!("{}/{}", base, target)
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.base_url, "http://localhost:5500");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.settle_ms, 0);
        assert_eq!(config.timeouts.action_ms, 5000);
        assert_eq!(config.timeouts.navigation_ms, 10000);
        assert_eq!(config.browser.viewport.width, 1280);
        assert!(config.browser.args.contains(&"--single-process".to_string()));
        assert!(config.locators.is_empty());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booking-e2e.toml");
        std::fs::write(
            &path,
            r#"
base_url = "http://127.0.0.1:8080/"
concurrency = 3

[browser]
engine = "firefox"
headless = false

[timeouts]
assertion_ms = 2000

[app]
command = ["npx", "live-server", "--port=8080"]

[locators]
"login.submit" = "role=button[name=\"Sign In\"]"
"#,
        )
        .unwrap();

        let config = RunnerConfig::load(&path).unwrap();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.browser.engine, Engine::Firefox);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport.height, 720);
        assert_eq!(config.timeouts.assertion_ms, 2000);
        assert_eq!(config.timeouts.action_ms, 5000);
        assert_eq!(config.app.command.len(), 3);

        let pages = config.page_map();
        assert_eq!(
            pages.get("login.submit"),
            Some(&Locator::Role {
                role: "button".into(),
                name: Some("Sign In".into())
            })
        );
        assert!(pages.get("signup.email").is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "base_url = \"localhost:5500\"\n").unwrap();
        assert!(matches!(RunnerConfig::load(&path), Err(E2eError::InvalidConfig(_))));

        std::fs::write(&path, "concurrency = 0\n").unwrap();
        assert!(matches!(RunnerConfig::load(&path), Err(E2eError::InvalidConfig(_))));
    }

    #[test]
    fn test_url_for() {
        let config = RunnerConfig {
            base_url: "http://localhost:5500/".into(),
            ..Default::default()
        };
        assert_eq!(config.url_for("/"), "http://localhost:5500/");
        assert_eq!(
            config.url_for("/professor/dashboard"),
            "http://localhost:5500/professor/dashboard"
        );
        assert_eq!(config.url_for("student/dashboard"), "http://localhost:5500/student/dashboard");
        assert_eq!(config.url_for("https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn test_engine_parse() {
        assert_eq!("Chrome".parse::<Engine>().unwrap(), Engine::Chromium);
        assert_eq!("webkit".parse::<Engine>().unwrap(), Engine::Webkit);
        assert!("lynx".parse::<Engine>().is_err());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let text = RunnerConfig::default().to_toml().unwrap();
        let parsed: RunnerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.base_url, DEFAULT_BASE_URL);
    }
}
