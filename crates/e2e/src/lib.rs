//! Booking E2E scenario framework
//!
//! This crate drives the booking web application through a real browser:
//! - Declarative YAML scenarios (sign-up, login, access control, booking)
//! - A page map of named locators so structural paths live in one place
//! - One isolated Playwright session per scenario, via a node bridge process
//! - Bounded waits and URL polling instead of fixed sleeps
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                              │
//! │    ├── launcher.launch() -> Box<dyn BrowserSession>          │
//! │    ├── goto(start) -> steps -> assertions                    │
//! │    ├── screenshot on failure, close on every path            │
//! │    └── run_suite() -> SuiteResult (buffered, ordered)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                             │
//! │    ├── id, name, tags, start, known_defect?                  │
//! │    ├── steps: navigate | fill | click | wait | wait_for_url  │
//! │    └── assertions: url_contains | url_not_contains |         │
//! │          text_visible | text_hidden | visible | any_contains │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightSession ── JSON lines ──> node bridge.js          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod locator;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod session;

pub use app::AppHandle;
pub use config::RunnerConfig;
pub use error::{E2eError, E2eResult, FailureKind};
pub use locator::{Locator, PageMap};
pub use runner::{ScenarioResult, ScenarioRunner, ScenarioStatus, SuiteResult};
pub use scenario::{Assertion, Scenario, Step};
pub use session::{BrowserLauncher, BrowserSession};
