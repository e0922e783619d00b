//! Browser session seam
//!
//! The runner only talks to these traits. [`crate::playwright`] provides the
//! real implementation; tests plug in an in-memory page.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RunnerConfig;
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::scenario::WaitState;

/// One isolated browser context, owned by a single scenario.
///
/// Locators handed to a session are always resolved (never aliases).
/// Element operations act on the first match on the most recently opened page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for the navigation to commit
    async fn goto(&mut self, url: &str, timeout: Duration) -> E2eResult<()>;

    /// Fill an input once it is editable
    async fn fill(&mut self, locator: &Locator, value: &str, timeout: Duration) -> E2eResult<()>;

    /// Click an element once it is actionable
    async fn click(&mut self, locator: &Locator, timeout: Duration) -> E2eResult<()>;

    /// Wait for an element to reach `state`
    async fn wait_for(&mut self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn current_url(&mut self) -> E2eResult<String>;

    /// Visibility right now, without waiting
    async fn is_visible(&mut self, locator: &Locator) -> E2eResult<bool>;

    /// Text content, `None` when no element matches
    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Rendered text of an element, waiting for it to exist
    async fn inner_text(&mut self, locator: &Locator, timeout: Duration) -> E2eResult<String>;

    /// Attribute value, `None` when the element or attribute is absent
    async fn attribute(&mut self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    /// Release the browser. Called exactly once, on every exit path.
    async fn close(self: Box<Self>) -> E2eResult<()>;
}

/// Produces a fresh session per scenario
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &RunnerConfig) -> E2eResult<Box<dyn BrowserSession>>;
}
