//! Session lifecycle: attach to a debugging browser or launch one.
//!
//! The browser is always started with a fixed profile directory so the
//! tracker login survives restarts, and with remote debugging enabled so
//! later runs can attach to it instead of launching again.

use crate::actions::BrowserActions;
use crate::error::{BrowserError, Result};
use crate::session::Session;
use bugfill_core::BrowserConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

/// Interval between endpoint probes while a launched browser starts up.
const STARTUP_POLL_MS: u64 = 250;

/// Per-request bound on an endpoint probe.
const PROBE_TIMEOUT_MS: u64 = 1000;

/// Default interval between DOM presence polls.
const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

#[cfg(target_os = "windows")]
const KNOWN_INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Users\{username}\AppData\Local\Google\Chrome\Application\chrome.exe",
];

#[cfg(target_os = "macos")]
const KNOWN_INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Users/{username}/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const KNOWN_INSTALL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

/// Subset of the `/json/version` response we rely on.
#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "Browser", default)]
    browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Owns the single browser session for its lifetime.
pub struct SessionManager {
    config: BrowserConfig,
    poll_interval: Duration,
    http: reqwest::Client,
    session: Option<Session>,
}

impl SessionManager {
    /// Create a manager; no browser is touched until `ensure_session`.
    #[must_use]
    pub fn new(config: BrowserConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(PROBE_TIMEOUT_MS))
            .build()
            .unwrap_or_default();

        Self {
            config,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            http,
            session: None,
        }
    }

    /// Interval the session polls the DOM at while waiting for elements.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The local `/json/version` URL of the debugging endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}/json/version", self.config.debug_port)
    }

    /// The current session, if one has been established.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether a debugging browser is answering on the configured port.
    pub async fn is_running(&self) -> bool {
        self.probe(&self.endpoint()).await.is_some()
    }

    /// Return the live session, attaching or launching on first use.
    ///
    /// # Errors
    /// Fails when no browser executable can be found, the launch fails, or
    /// the debugging endpoint does not come up within the startup timeout.
    pub async fn ensure_session(&mut self) -> Result<&Session> {
        if self.session.is_none() {
            let session = self.start().await?;
            self.session = Some(session);
        }
        self.session.as_ref().ok_or(BrowserError::NoActiveTab)
    }

    /// Open a fresh tab in the current session.
    pub async fn new_tab(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.new_tab().await,
            None => Err(BrowserError::NoActiveTab),
        }
    }

    /// Close the active tab, keeping the session alive.
    pub async fn close_current_tab(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.close_current_tab().await,
            None => Ok(()),
        }
    }

    /// Terminate the browser. Does nothing when no session exists.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(
                endpoint = %session.endpoint(),
                launched = session.owns_process(),
                "closing browser"
            );
            session.shutdown().await;
        }
    }

    async fn start(&self) -> Result<Session> {
        let endpoint = self.endpoint();

        if let Some(info) = self.probe(&endpoint).await {
            tracing::info!(
                endpoint = %endpoint,
                browser = %info.browser,
                "attaching to running browser"
            );
            return Session::attach(
                &info.web_socket_debugger_url,
                endpoint,
                None,
                self.poll_interval,
            )
            .await;
        }

        tracing::info!(endpoint = %endpoint, "no debugging browser found, launching one");
        let child = self.launch().await?;
        let info = self.wait_for_endpoint(&endpoint).await?;
        Session::attach(
            &info.web_socket_debugger_url,
            endpoint,
            Some(child),
            self.poll_interval,
        )
        .await
    }

    async fn probe(&self, endpoint: &str) -> Option<VersionInfo> {
        let response = self.http.get(endpoint).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<VersionInfo>().await.ok()
    }

    async fn launch(&self) -> Result<Child> {
        let candidates = candidate_paths(&self.config, current_username().as_deref());
        let executable = find_executable(&candidates)?;

        tokio::fs::create_dir_all(&self.config.user_data_dir)
            .await
            .map_err(|e| BrowserError::LaunchFailed {
                path: executable.clone(),
                reason: format!(
                    "cannot create profile directory {}: {e}",
                    self.config.user_data_dir.display()
                ),
            })?;

        let child = Command::new(&executable)
            .args(launch_args(&self.config))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed {
                path: executable.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            path = %executable.display(),
            profile = %self.config.user_data_dir.display(),
            "launched browser"
        );
        Ok(child)
    }

    async fn wait_for_endpoint(&self, endpoint: &str) -> Result<VersionInfo> {
        let timeout = self.config.startup_timeout();
        let started = Instant::now();

        loop {
            if let Some(info) = self.probe(endpoint).await {
                tracing::debug!(elapsed = ?started.elapsed(), "debugging endpoint is up");
                return Ok(info);
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::DebugEndpointUnreachable {
                    endpoint: endpoint.to_string(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(Duration::from_millis(STARTUP_POLL_MS)).await;
        }
    }
}

/// Command-line flags for a launched browser.
#[must_use]
pub fn launch_args(config: &BrowserConfig) -> Vec<String> {
    vec![
        format!("--remote-debugging-port={}", config.debug_port),
        format!("--user-data-dir={}", config.user_data_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ]
}

/// Executable candidates in search order: the configured path, then the
/// platform's known install locations with `{username}` expanded.
#[must_use]
pub fn candidate_paths(config: &BrowserConfig, username: Option<&str>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = config.executable_path.iter().cloned().collect();

    for path in KNOWN_INSTALL_PATHS {
        if path.contains("{username}") {
            if let Some(name) = username {
                candidates.push(PathBuf::from(path.replace("{username}", name)));
            }
        } else {
            candidates.push(PathBuf::from(path));
        }
    }

    candidates
}

/// First candidate that exists as a file.
///
/// # Errors
/// Returns `ExecutableNotFound` listing every searched path.
pub fn find_executable(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| BrowserError::ExecutableNotFound {
            searched: candidates.to_vec(),
        })
}

fn current_username() -> Option<String> {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .ok()
        .filter(|name| !name.is_empty())
}
