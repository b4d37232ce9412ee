use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};

use super::cdp::CdpClient;
use super::error::BrowserError;
use super::page::CdpPage;

const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(20);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const ENDPOINT_BANNER: &str = "DevTools listening on ";

pub const CANDIDATE_BINARIES: [&str; 5] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub binary: Option<PathBuf>,
    pub headful: bool,
}

/// A browser process owned for the duration of one run.
///
/// Dropping it kills the process; [`Browser::close`] shuts it down politely.
pub struct Browser {
    child: Child,
    control: CdpClient,
    _profile: TempDir,
}

impl Browser {
    /// Start a browser and open one blank page target in it.
    pub async fn launch(options: &LaunchOptions) -> Result<(Self, CdpPage), BrowserError> {
        let binary = resolve_binary(options.binary.as_ref())?;
        let binary_label = binary.display().to_string();
        let launch_failed = |reason: String| BrowserError::LaunchFailed {
            binary: binary_label.clone(),
            reason,
        };

        let profile = tempfile::Builder::new()
            .prefix("spa-docs-sync-profile-")
            .tempdir()
            .map_err(|err| launch_failed(format!("cannot create profile dir: {err}")))?;

        let mut command = Command::new(&binary);
        command
            .arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-gpu")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !options.headful {
            command.arg("--headless=new");
        }
        command.arg("about:blank");

        let mut child = command
            .spawn()
            .map_err(|err| launch_failed(err.to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| launch_failed("stderr was not captured".to_string()))?;

        let browser_ws = read_endpoint(stderr).await.map_err(launch_failed)?;
        tracing::info!(binary = %binary_label, endpoint = %browser_ws, "browser started");

        let control = CdpClient::connect(&browser_ws).await?;
        let created = control
            .send("Target.createTarget", serde_json::json!({ "url": "about:blank" }))
            .await?;
        let target_id = created
            .get("targetId")
            .and_then(|id| id.as_str())
            .ok_or_else(|| BrowserError::Protocol {
                detail: "Target.createTarget returned no targetId".to_string(),
            })?;
        let page_ws = page_endpoint(&browser_ws, target_id).ok_or_else(|| BrowserError::Protocol {
            detail: format!("unexpected browser endpoint: {browser_ws}"),
        })?;

        let page = CdpPage::attach(&page_ws).await?;

        Ok((
            Self {
                child,
                control,
                _profile: profile,
            },
            page,
        ))
    }

    pub async fn close(mut self) {
        if let Err(err) = self.control.send("Browser.close", serde_json::json!({})).await {
            tracing::debug!(error = %err, "Browser.close failed, killing process");
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "browser exited"),
            _ => {
                if let Err(err) = self.child.kill().await {
                    tracing::warn!(error = %err, "failed to kill browser process");
                }
            }
        }
    }
}

fn resolve_binary(explicit: Option<&PathBuf>) -> Result<PathBuf, BrowserError> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }

    CANDIDATE_BINARIES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| BrowserError::BinaryNotFound {
            searched: CANDIDATE_BINARIES.join(", "),
        })
}

/// Scan the browser's stderr for the DevTools banner, then keep draining it
/// in the background so the pipe never fills.
async fn read_endpoint(stderr: ChildStderr) -> Result<String, String> {
    let mut lines = BufReader::new(stderr).lines();

    let endpoint = tokio::time::timeout(ENDPOINT_TIMEOUT, async {
        while let Some(line) = lines.next_line().await.map_err(|err| err.to_string())? {
            if let Some(endpoint) = parse_endpoint_banner(&line) {
                return Ok::<String, String>(endpoint);
            }
            tracing::trace!(line = %line, "browser stderr");
        }
        Err("browser exited before announcing its DevTools endpoint".to_string())
    })
    .await
    .map_err(|_| format!("no DevTools endpoint within {ENDPOINT_TIMEOUT:?}"))??;

    tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::trace!(line = %line, "browser stderr");
        }
    });

    Ok(endpoint)
}

pub fn parse_endpoint_banner(line: &str) -> Option<String> {
    let endpoint = line.trim().strip_prefix(ENDPOINT_BANNER)?.trim();
    endpoint.starts_with("ws://").then(|| endpoint.to_string())
}

/// `ws://host:port/devtools/browser/<id>` -> `ws://host:port/devtools/page/<target_id>`.
pub fn page_endpoint(browser_ws: &str, target_id: &str) -> Option<String> {
    let (origin, _) = browser_ws.split_once("/devtools/browser/")?;
    Some(format!("{origin}/devtools/page/{target_id}"))
}
