//! Application under test: optional spawning and readiness probing

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::{E2eError, E2eResult};

const PROBE_INTERVAL: Duration = Duration::from_millis(100);
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to the application, spawned by us or already running
pub struct AppHandle {
    child: Option<Child>,
    base_url: String,
}

impl AppHandle {
    /// Start the configured app command (if any) and wait until the base URL answers
    pub async fn start(config: &RunnerConfig) -> E2eResult<Self> {
        let mut handle = AppHandle {
            child: None,
            base_url: config.base_url.clone(),
        };

        if let Some((program, args)) = config.app.command.split_first() {
            info!("Spawning application: {}", config.app.command.join(" "));

            let mut cmd = Command::new(program);
            cmd.args(args).stdout(Stdio::null()).stderr(Stdio::null());
            if let Some(dir) = &config.app.workdir {
                cmd.current_dir(dir);
            }

            let child = cmd
                .spawn()
                .map_err(|e| E2eError::AppStartup(format!("failed to spawn {}: {}", program, e)))?;
            handle.child = Some(child);
        }

        if config.app.probe || handle.child.is_some() {
            wait_until_ready(&handle.base_url, config.app.ready_timeout()).await?;
            info!("Application is up at {}", handle.base_url);
        }

        Ok(handle)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether this handle owns the app process
    pub fn spawned(&self) -> bool {
        self.child.is_some()
    }

    /// Stop a spawned app: SIGTERM first, then kill
    pub fn stop(&mut self) -> E2eResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        info!("Stopping application (pid: {})", child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        if let Ok(None) = child.try_wait() {
            let _ = child.kill();
        }
        let _ = child.wait();
        Ok(())
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

pub type ProbeClient = reqwest::Client;

/// HTTP client for probes; redirects are reported, not followed
pub fn probe_client(request_timeout: Duration) -> E2eResult<ProbeClient> {
    Ok(reqwest::Client::builder()
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Single request; 2xx and 3xx both count as up
pub async fn probe(client: &ProbeClient, url: &str) -> E2eResult<reqwest::StatusCode> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if status.is_success() || status.is_redirection() {
        Ok(status)
    } else {
        Err(E2eError::AppStartup(format!("{} answered {}", url, status)))
    }
}

/// Poll `url` until it answers or `window` elapses
pub async fn wait_until_ready(url: &str, window: Duration) -> E2eResult<()> {
    let client = probe_client(PROBE_REQUEST_TIMEOUT)?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match probe(&client, url).await {
            Ok(status) => {
                debug!("{} answered {} after {} attempt(s)", url, status, attempts);
                return Ok(());
            }
            Err(E2eError::Http(e)) => {
                if attempts == 1 {
                    info!("Waiting for application at {}...", url);
                }
                // Connection refused is expected while the app is starting
                if !e.is_connect() {
                    warn!("Probe error: {}", e);
                }
            }
            Err(e) => warn!("{}", e),
        }

        if start.elapsed() >= window {
            return Err(E2eError::AppUnreachable {
                url: url.to_string(),
                attempts,
            });
        }
        sleep(PROBE_INTERVAL).await;
    }
}
