use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

use super::ArtifactParseError;
use crate::model::{StrategyMetrics, StrategyReport, Verdict};

pub const MIRROR_THRESHOLD: f64 = 0.8;
pub const DOCUMENT_THRESHOLD: f64 = 0.8;
pub const TREE_THRESHOLD: f64 = 0.9;

/// Subdirectory count at which a mirror counts as section-structured.
pub const MIRROR_TREE_MIN_SUBDIRS: usize = 3;
/// Fewer content files than this means the mirror only caught the app shell.
pub const MIRROR_SHELL_MAX_FILES: usize = 5;
/// A single-document capture shorter than this is likely just the TOC.
pub const DOCUMENT_TOC_MAX_LINES: usize = 300;

const DOCUMENT_FILE: &str = "content.md";
const SECTION_MARKER: &str = "## ";
const MIRROR_CACHE_MARKER: &str = "hts-";
const MIRROR_INDEX_MARKER: &str = "index.html";

/// `count >= threshold * expected`. An expected count of zero is met by anything.
pub fn meets_threshold(count: usize, expected: usize, threshold: f64) -> bool {
    count as f64 >= expected as f64 * threshold
}

/// `count / expected`, 0 when nothing is expected. Not capped: a strategy may
/// over-count relative to the sitemap.
pub fn strategy_coverage(count: usize, expected: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    count as f64 / expected as f64
}

fn verdict_for(count: usize, expected: usize, threshold: f64) -> Verdict {
    if meets_threshold(count, expected, threshold) {
        Verdict::Complete
    } else {
        Verdict::Incomplete
    }
}

pub fn missing() -> StrategyReport {
    StrategyReport {
        exists: false,
        verdict: Verdict::Missing,
        metrics: None,
        notes: None,
    }
}

/// A present tree whose inspection failed; never escalates past its strategy.
pub fn errored(notes: String) -> StrategyReport {
    StrategyReport {
        exists: true,
        verdict: Verdict::Error,
        metrics: None,
        notes: Some(notes),
    }
}

/// Whole-site HTML mirror.
pub fn check_mirror(root: &Path, expected: usize) -> Result<StrategyReport> {
    let html_files = collect_files(root, "html")?;

    let mut subdirectories = std::collections::BTreeSet::new();
    let mut content_files = 0;
    for path in &html_files {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if is_mirror_artifact(relative) {
            continue;
        }
        content_files += 1;

        let mut components = relative.components();
        if let (Some(first), Some(_)) = (components.next(), components.next()) {
            subdirectories.insert(first.as_os_str().to_string_lossy().to_string());
        }
    }

    let has_tree_structure = subdirectories.len() >= MIRROR_TREE_MIN_SUBDIRS;
    let notes = if content_files < MIRROR_SHELL_MAX_FILES {
        "React SPA shell (no content)".to_string()
    } else if has_tree_structure {
        format!(
            "Full HTML mirror with tree structure ({} sections)",
            subdirectories.len()
        )
    } else {
        "HTML files but flat structure".to_string()
    };

    Ok(StrategyReport {
        exists: true,
        verdict: verdict_for(content_files, expected, MIRROR_THRESHOLD),
        metrics: Some(StrategyMetrics::Mirror {
            html_files: content_files,
            total_files: html_files.len(),
            subdirectories: subdirectories.len(),
            has_tree_structure,
            coverage: strategy_coverage(content_files, expected),
        }),
        notes: Some(notes),
    })
}

/// Mirror-tool bookkeeping (cache directories, generated index pages), judged
/// on the path relative to the mirror root.
fn is_mirror_artifact(path: &Path) -> bool {
    let in_cache = path.to_string_lossy().contains(MIRROR_CACHE_MARKER);
    let is_index = path
        .file_name()
        .map(|name| name.to_string_lossy().contains(MIRROR_INDEX_MARKER))
        .unwrap_or(false);
    in_cache || is_index
}

/// Where the single-document artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Structured,
    Plain,
}

/// Extract the markdown body of the single-document artifact.
///
/// A JSON object must carry `markdown.raw_markdown`; anything that does not
/// parse as a JSON object is taken as markdown text.
pub fn parse_document(
    path: &Path,
    raw: &[u8],
) -> Result<(String, DocumentFormat), ArtifactParseError> {
    if let Ok(object) = serde_json::from_slice::<Map<String, Value>>(raw) {
        let markdown = object
            .get("markdown")
            .and_then(|markdown| markdown.get("raw_markdown"))
            .and_then(Value::as_str)
            .ok_or_else(|| ArtifactParseError::MissingRawMarkdown {
                path: path.to_path_buf(),
            })?;
        return Ok((markdown.to_string(), DocumentFormat::Structured));
    }

    let text = std::str::from_utf8(raw).map_err(|_| ArtifactParseError::NotText {
        path: path.to_path_buf(),
    })?;
    Ok((text.to_string(), DocumentFormat::Plain))
}

/// Single-document bulk render; sections are counted by level-2 headings.
pub fn check_document(root: &Path, expected: usize) -> Result<StrategyReport> {
    let path = root.join(DOCUMENT_FILE);
    if !path.is_file() {
        return Ok(errored(format!(
            "Directory exists but {DOCUMENT_FILE} missing"
        )));
    }

    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let (markdown, format) = match parse_document(&path, &raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, "single-document artifact could not be parsed");
            return Ok(errored(err.to_string()));
        }
    };

    let lines = markdown.split('\n').collect::<Vec<&str>>();
    let sections_detected = lines
        .iter()
        .filter(|line| line.starts_with(SECTION_MARKER))
        .count();

    let notes = match format {
        DocumentFormat::Structured if lines.len() < DOCUMENT_TOC_MAX_LINES => "TOC-only capture",
        DocumentFormat::Structured => "Full content",
        DocumentFormat::Plain => "Plain markdown format",
    };

    Ok(StrategyReport {
        exists: true,
        verdict: verdict_for(sections_detected, expected, DOCUMENT_THRESHOLD),
        metrics: Some(StrategyMetrics::Document {
            lines: lines.len(),
            sections_detected,
            expected_sections: expected,
            coverage: strategy_coverage(sections_detected, expected),
        }),
        notes: Some(notes.to_string()),
    })
}

/// The navigation driver's own section tree.
pub fn check_tree(root: &Path, expected: usize) -> Result<StrategyReport> {
    let markdown_files = collect_files(root, "md")?.len();

    let mut directories = 0;
    for entry in fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))? {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?
            .is_dir()
        {
            directories += 1;
        }
    }

    Ok(StrategyReport {
        exists: true,
        verdict: verdict_for(markdown_files, expected, TREE_THRESHOLD),
        metrics: Some(StrategyMetrics::Tree {
            markdown_files,
            directories,
            expected_sections: expected,
            coverage: strategy_coverage(markdown_files, expected),
        }),
        notes: Some("Directory tree structure (ground truth)".to_string()),
    })
}

/// Every file under `root` (recursively) whose extension is `extension`.
fn collect_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))?;

        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("failed to inspect file type: {}", path.display()))?;

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == extension)
                .unwrap_or(false);
            if file_type.is_file() && matches {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
