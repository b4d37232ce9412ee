//! Navigation-driver run: one browser session, every navigation target
//! visited in turn, one markdown file per captured section.

use thiserror::Error;

use crate::browser::BrowserError;

mod driver;
mod poller;
mod run;
mod writer;

pub use run::run;

/// Lifecycle of one navigation target within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Discovered,
    Triggered,
    Polling,
    Captured,
    CapturedWithWarning,
    Written,
    Errored,
}

impl TargetState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Triggered => "triggered",
            Self::Polling => "polling",
            Self::Captured => "captured",
            Self::CapturedWithWarning => "captured-with-warning",
            Self::Written => "written",
            Self::Errored => "errored",
        }
    }
}

/// Soft signals: the section is still captured, with reduced confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetWarning {
    /// The heading probe never moved off its baseline within the budget.
    ChangeDetectionTimeout { attempts: u32 },
    /// No in-app anchor matched; `location.hash` was overwritten instead.
    NavigationFallback,
}

/// Per-target failures. The run logs them and moves on.
#[derive(Debug, Error)]
pub enum CaptureFailure {
    #[error("not a content route: {url}")]
    Unroutable { url: String },

    #[error("no content root resolved on {url}")]
    ContentRootMissing { url: String },

    #[error("content root on {url} reduced to empty text")]
    EmptyContent { url: String },

    #[error(transparent)]
    Browser(#[from] BrowserError),
}
