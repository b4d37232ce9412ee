use std::time::Duration;

use thiserror::Error;

/// Error code given to commands still pending when the DevTools socket closes.
pub const SOCKET_CLOSED_CODE: i64 = -1;

/// Failures of the browser process or of the DevTools conversation with it.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no Chrome/Chromium binary found (set SPA_DOCS_CHROME or install one of: {searched})")]
    BinaryNotFound { searched: String },

    #[error("failed to launch browser {binary}: {reason}")]
    LaunchFailed { binary: String, reason: String },

    #[error("failed to connect to DevTools at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("CDP error {code}: {message}")]
    Cdp { code: i64, message: String },

    #[error("CDP command '{method}' timed out after {duration:?}")]
    Timeout { method: String, duration: Duration },

    #[error("CDP protocol error: {detail}")]
    Protocol { detail: String },

    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("JavaScript exception: {message}")]
    JsException { message: String },
}

impl BrowserError {
    /// Whether the browser session itself is gone, as opposed to one page
    /// interaction failing. Callers abort the run on these.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            Self::BinaryNotFound { .. }
            | Self::LaunchFailed { .. }
            | Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::Protocol { .. } => true,
            Self::Cdp { code, .. } => *code == SOCKET_CLOSED_CODE,
            Self::NavigationFailed { .. } | Self::JsException { .. } => false,
        }
    }
}
