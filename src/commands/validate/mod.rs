//! Cross-validation of every capture strategy's output against the sitemap
//! ground truth of a domain root.

use std::path::PathBuf;

use thiserror::Error;

mod recommendation;
mod report;
mod run;
mod strategies;
#[cfg(test)]
mod tests;

pub use self::run::run;

/// Failures that stop a validation run before any report is written.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("sitemap not found at {path}; the navigation driver must run first to produce the ground truth")]
    ManifestMissing { path: PathBuf },

    #[error("domain directory not found: {path}")]
    DomainMissing { path: PathBuf },

    #[error("sitemap at {path} is unreadable: {reason}")]
    ManifestUnreadable { path: PathBuf, reason: String },
}

/// The single-document artifact could not be interpreted. Scoped to that
/// strategy: it turns its verdict into `ERROR` and nothing else.
#[derive(Debug, Error)]
pub enum ArtifactParseError {
    #[error("{path} is neither JSON nor UTF-8 text")]
    NotText { path: PathBuf },

    #[error("{path} is JSON but has no `markdown.raw_markdown` string")]
    MissingRawMarkdown { path: PathBuf },
}
