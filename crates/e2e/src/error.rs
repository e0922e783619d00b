//! Error types for E2E scenarios

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Application did not answer at {url} after {attempts} attempts")]
    AppUnreachable { url: String, attempts: usize },

    #[error("Application failed to start: {0}")]
    AppStartup(String),

    #[error("Node/Playwright not found ({0}). Install with: npm install playwright && npx playwright install chromium")]
    PlaywrightNotFound(String),

    #[error("Browser bridge error: {0}")]
    Browser(String),

    #[error("Browser bridge exited unexpectedly")]
    BridgeClosed,

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Invalid locator '{0}'")]
    InvalidLocator(String),

    #[error("Unknown locator alias '@{0}'")]
    UnknownLocator(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// How a scenario failure should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A step could not be carried out: missing element or timeout
    Infrastructure,
    /// The page did not show what the scenario expects
    Assertion,
    /// The browser session itself broke
    Session,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Infrastructure => "infrastructure",
            FailureKind::Assertion => "assertion",
            FailureKind::Session => "session",
        }
    }
}

impl E2eError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            E2eError::AssertionFailed(_) => FailureKind::Assertion,
            E2eError::ElementNotFound { .. } | E2eError::Timeout(_) => FailureKind::Infrastructure,
            _ => FailureKind::Session,
        }
    }
}
