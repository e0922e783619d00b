//! Playwright browser automation through a node bridge process
//!
//! Every session spawns `node` running [`BRIDGE_SCRIPT`], which launches the
//! browser, creates a fresh context and page, then serves commands over a
//! JSON-lines protocol on stdin/stdout until it is told to close.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::scenario::WaitState;
use crate::session::{BrowserLauncher, BrowserSession};

/// Bridge program run by node
pub const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Extra time granted on top of a command's own timeout for the reply
const REPLY_SLACK: Duration = Duration::from_secs(2);

/// Upper bound for commands that do not wait on the page themselves
const QUICK_COMMAND: Duration = Duration::from_secs(5);

/// A single bridge command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum BridgeCommand<'a> {
    Goto {
        url: &'a str,
        timeout: u64,
        #[serde(rename = "waitUntil")]
        wait_until: &'a str,
    },
    Fill {
        selector: String,
        value: &'a str,
        timeout: u64,
    },
    Click {
        selector: String,
        timeout: u64,
    },
    WaitFor {
        selector: String,
        state: &'a str,
        timeout: u64,
    },
    Url,
    IsVisible {
        selector: String,
    },
    TextContent {
        selector: String,
        timeout: u64,
    },
    InnerText {
        selector: String,
        timeout: u64,
    },
    GetAttribute {
        selector: String,
        name: &'a str,
        timeout: u64,
    },
    Screenshot {
        path: String,
        #[serde(rename = "fullPage")]
        full_page: bool,
    },
    Close,
}

impl BridgeCommand<'_> {
    fn op(&self) -> &'static str {
        match self {
            BridgeCommand::Goto { .. } => "goto",
            BridgeCommand::Fill { .. } => "fill",
            BridgeCommand::Click { .. } => "click",
            BridgeCommand::WaitFor { .. } => "waitFor",
            BridgeCommand::Url => "url",
            BridgeCommand::IsVisible { .. } => "isVisible",
            BridgeCommand::TextContent { .. } => "textContent",
            BridgeCommand::InnerText { .. } => "innerText",
            BridgeCommand::GetAttribute { .. } => "getAttribute",
            BridgeCommand::Screenshot { .. } => "screenshot",
            BridgeCommand::Close => "close",
        }
    }

    fn selector(&self) -> Option<&str> {
        match self {
            BridgeCommand::Fill { selector, .. }
            | BridgeCommand::Click { selector, .. }
            | BridgeCommand::WaitFor { selector, .. }
            | BridgeCommand::IsVisible { selector }
            | BridgeCommand::TextContent { selector, .. }
            | BridgeCommand::InnerText { selector, .. }
            | BridgeCommand::GetAttribute { selector, .. } => Some(selector),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self.selector() {
            Some(selector) => format!("{} {}", self.op(), selector),
            None => self.op().to_string(),
        }
    }

    /// JSON line sent to the bridge
    fn encode(&self, id: u64) -> E2eResult<String> {
        let mut payload = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut payload {
            map.insert("id".to_string(), Value::from(id));
        }
        let mut line = serde_json::to_string(&payload)?;
        line.push('\n');
        Ok(line)
    }
}

/// A line received from the bridge: a command reply or a lifecycle event
#[derive(Debug, Default, Deserialize)]
struct BridgeReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl BridgeReply {
    fn into_result(self, command: &BridgeCommand<'_>) -> E2eResult<Value> {
        if self.ok {
            return Ok(self.value);
        }

        let reason = self.error.unwrap_or_else(|| "unknown bridge error".to_string());
        match command.selector() {
            Some(selector) if self.missing => Err(E2eError::ElementNotFound {
                selector: selector.to_string(),
            }),
            _ if self.timeout => Err(E2eError::Timeout(format!(
                "{}: {}",
                command.describe(),
                first_line(&reason)
            ))),
            _ => Err(E2eError::Browser(format!(
                "{} failed: {}",
                command.describe(),
                first_line(&reason)
            ))),
        }
    }
}

/// Playwright errors carry a multi-line call log; the first line is the gist
fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message).trim()
}

fn as_optional_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Launch options handed to the bridge on its command line
fn launch_options(config: &RunnerConfig) -> Value {
    let browser = &config.browser;
    json!({
        "engine": browser.engine.as_str(),
        "headless": browser.headless,
        "args": browser.args,
        "viewport": {
            "width": browser.viewport.width,
            "height": browser.viewport.height,
        },
        "defaultTimeout": config.timeouts.action_ms,
        "module": browser.playwright_module,
    })
}

/// Launches one [`PlaywrightSession`] per scenario
#[derive(Debug, Clone, Default)]
pub struct PlaywrightLauncher;

impl PlaywrightLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Check that node can be executed
    pub async fn check_node(node: &Path) -> E2eResult<String> {
        let output = Command::new(node)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| E2eError::PlaywrightNotFound(format!("{}: {}", node.display(), e)))?;

        if !output.status.success() {
            return Err(E2eError::PlaywrightNotFound(format!(
                "{} --version exited with {}",
                node.display(),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    async fn launch(&self, config: &RunnerConfig) -> E2eResult<Box<dyn BrowserSession>> {
        let session = PlaywrightSession::launch(config).await?;
        Ok(Box::new(session))
    }
}

/// A browser context served by a node bridge process
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    close_timeout: Duration,
    /// Holds the bridge script for the lifetime of the process
    _workdir: TempDir,
}

impl PlaywrightSession {
    /// Spawn the bridge and wait until the browser is up
    pub async fn launch(config: &RunnerConfig) -> E2eResult<Self> {
        let browser = &config.browser;
        PlaywrightLauncher::check_node(&browser.node_binary).await?;

        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!(
            "Launching {} bridge (headless: {})",
            browser.engine.as_str(),
            browser.headless
        );

        let mut cmd = Command::new(&browser.node_binary);
        cmd.arg(&script_path)
            .arg(launch_options(config).to_string())
            .current_dir(std::env::current_dir()?)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(node_path) = &browser.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let mut child = cmd.spawn().map_err(|e| {
            E2eError::PlaywrightNotFound(format!("{}: {}", browser.node_binary.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Browser("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Browser("bridge stdout unavailable".into()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge] {}", line);
                }
            });
        }

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            close_timeout: config.timeouts.close(),
            _workdir: workdir,
        };

        match timeout(config.timeouts.launch(), session.wait_ready()).await {
            Ok(Ok(())) => {
                info!("Browser session ready (pid: {:?})", session.child.id());
                Ok(session)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(E2eError::Timeout(format!(
                "browser launch after {} ms",
                config.timeouts.launch_ms
            ))),
        }
    }

    async fn wait_ready(&mut self) -> E2eResult<()> {
        loop {
            let line = self.stdout.next_line().await?.ok_or(E2eError::BridgeClosed)?;
            match serde_json::from_str::<BridgeReply>(&line) {
                Ok(reply) if reply.event.as_deref() == Some("ready") => return Ok(()),
                Ok(reply) if reply.event.as_deref() == Some("error") => {
                    let message = reply.message.unwrap_or_default();
                    return Err(if message.starts_with("cannot load") {
                        E2eError::PlaywrightNotFound(message)
                    } else {
                        E2eError::Browser(message)
                    });
                }
                _ => debug!("[bridge] {}", line),
            }
        }
    }

    async fn read_reply(&mut self, id: u64) -> E2eResult<BridgeReply> {
        loop {
            let line = self.stdout.next_line().await?.ok_or(E2eError::BridgeClosed)?;
            match serde_json::from_str::<BridgeReply>(&line) {
                Ok(reply) if reply.id == Some(id) => return Ok(reply),
                Ok(_) | Err(_) => debug!("[bridge] skipping {}", line),
            }
        }
    }

    /// Send a command and wait for its reply
    async fn request(&mut self, command: BridgeCommand<'_>, wait: Duration) -> E2eResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        debug!("bridge <- #{} {}", id, command.describe());
        let line = command.encode(id)?;
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|_| E2eError::BridgeClosed)?;
        self.stdin.flush().await.map_err(|_| E2eError::BridgeClosed)?;

        match timeout(wait + REPLY_SLACK, self.read_reply(id)).await {
            Ok(reply) => reply?.into_result(&command),
            Err(_) => Err(E2eError::Timeout(format!(
                "{} (no reply from bridge)",
                command.describe()
            ))),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn goto(&mut self, url: &str, wait: Duration) -> E2eResult<()> {
        let command = BridgeCommand::Goto {
            url,
            timeout: millis(wait),
            wait_until: "commit",
        };
        self.request(command, wait).await.map(|_| ())
    }

    async fn fill(&mut self, locator: &Locator, value: &str, wait: Duration) -> E2eResult<()> {
        let command = BridgeCommand::Fill {
            selector: locator.to_selector()?,
            value,
            timeout: millis(wait),
        };
        self.request(command, wait).await.map(|_| ())
    }

    async fn click(&mut self, locator: &Locator, wait: Duration) -> E2eResult<()> {
        let command = BridgeCommand::Click {
            selector: locator.to_selector()?,
            timeout: millis(wait),
        };
        self.request(command, wait).await.map(|_| ())
    }

    async fn wait_for(&mut self, locator: &Locator, state: WaitState, wait: Duration) -> E2eResult<()> {
        let command = BridgeCommand::WaitFor {
            selector: locator.to_selector()?,
            state: state.as_str(),
            timeout: millis(wait),
        };
        self.request(command, wait).await.map(|_| ())
    }

    async fn current_url(&mut self) -> E2eResult<String> {
        let value = self.request(BridgeCommand::Url, QUICK_COMMAND).await?;
        Ok(as_optional_string(value).unwrap_or_default())
    }

    async fn is_visible(&mut self, locator: &Locator) -> E2eResult<bool> {
        let command = BridgeCommand::IsVisible {
            selector: locator.to_selector()?,
        };
        let value = self.request(command, QUICK_COMMAND).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        let command = BridgeCommand::TextContent {
            selector: locator.to_selector()?,
            timeout: millis(QUICK_COMMAND),
        };
        let value = self.request(command, QUICK_COMMAND).await?;
        Ok(as_optional_string(value))
    }

    async fn inner_text(&mut self, locator: &Locator, wait: Duration) -> E2eResult<String> {
        let command = BridgeCommand::InnerText {
            selector: locator.to_selector()?,
            timeout: millis(wait),
        };
        let value = self.request(command, wait).await?;
        Ok(as_optional_string(value).unwrap_or_default())
    }

    async fn attribute(&mut self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let command = BridgeCommand::GetAttribute {
            selector: locator.to_selector()?,
            name,
            timeout: millis(QUICK_COMMAND),
        };
        let value = self.request(command, QUICK_COMMAND).await?;
        Ok(as_optional_string(value))
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let command = BridgeCommand::Screenshot {
            path: path.to_string_lossy().to_string(),
            full_page: true,
        };
        self.request(command, Duration::from_secs(15)).await.map(|_| ())
    }

    async fn close(self: Box<Self>) -> E2eResult<()> {
        let mut session = *self;
        let id = session.next_id;

        if let Ok(line) = BridgeCommand::Close.encode(id) {
            if session.stdin.write_all(line.as_bytes()).await.is_ok() {
                let _ = session.stdin.flush().await;
            }
        }

        match timeout(session.close_timeout, session.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Bridge exited with {}", status);
            }
            Ok(Err(e)) => {
                warn!("Waiting for bridge failed: {}", e);
                let _ = session.child.kill().await;
            }
            Err(_) => {
                warn!("Bridge did not exit within {:?}, killing it", session.close_timeout);
                let _ = session.child.kill().await;
            }
        }
        Ok(())
    }
}
