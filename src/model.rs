use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const SITEMAP_FILE: &str = "sitemap.json";
pub const VALIDATION_REPORT_FILE: &str = "validation-report.json";
pub const OUTPUT_STRUCTURE_TREE: &str = "directory-tree";

/// Section tree written by the navigation driver; the ground-truth producer.
pub const TREE_STRATEGY_DIR: &str = "spa-tree";
pub const TREE_STRATEGY_ID: &str = "spa-tree-cdp";
/// Single-document bulk render (`content.md`).
pub const DOCUMENT_STRATEGY_DIR: &str = "crawl4ai";
/// Whole-site HTML mirror.
pub const MIRROR_STRATEGY_DIR: &str = "httrack";

/// How the router was driven to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationMethod {
    #[default]
    Click,
    FragmentFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CapturedSection {
    pub url: String,
    pub section: String,
    pub subsection: String,
    pub relative_file_path: String,
    pub byte_size: usize,
    pub navigation: NavigationMethod,
    pub content_changed: bool,
    pub poll_attempts: u32,
    pub content_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FailedTarget {
    pub url: String,
    pub reason: String,
}

/// The sitemap: what one navigation run discovered and captured.
///
/// Fields default when absent so manifests written by other tools or older
/// runs still load; the aliases accept the older sitemap key names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Manifest {
    pub base_url: String,
    pub timestamp: String,
    #[serde(alias = "scraper")]
    pub strategy_id: String,
    pub output_structure: String,
    pub sections: Vec<CapturedSection>,
    pub failed_targets: Vec<FailedTarget>,
    #[serde(alias = "total_sections")]
    pub total_targets_discovered: usize,
    #[serde(alias = "scraped_sections")]
    pub total_captured: usize,
    #[serde(alias = "coverage")]
    pub coverage_ratio: f64,
    pub directories: BTreeSet<String>,
}

/// Captured over discovered, 0 when nothing was discovered.
pub fn coverage_ratio(captured: usize, discovered: usize) -> f64 {
    if discovered == 0 {
        return 0.0;
    }
    (captured as f64 / discovered as f64).min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Complete,
    Incomplete,
    Missing,
    Error,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "COMPLETE",
            Self::Incomplete => "INCOMPLETE",
            Self::Missing => "MISSING",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub sections: usize,
    pub directories: usize,
    pub coverage: f64,
    pub strategy_id: String,
}

/// Strategy-shaped measurements; serialized flat next to the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategyMetrics {
    Mirror {
        html_files: usize,
        total_files: usize,
        subdirectories: usize,
        has_tree_structure: bool,
        coverage: f64,
    },
    Document {
        lines: usize,
        sections_detected: usize,
        expected_sections: usize,
        coverage: f64,
    },
    Tree {
        markdown_files: usize,
        directories: usize,
        expected_sections: usize,
        coverage: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub exists: bool,
    pub verdict: Verdict,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<StrategyMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallVerdict {
    pub complete: Vec<String>,
    pub incomplete: Vec<String>,
    pub missing: Vec<String>,
    pub errored: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub domain: String,
    pub generated_at: String,
    pub ground_truth: GroundTruth,
    pub strategies: BTreeMap<String, StrategyReport>,
    pub overall: OverallVerdict,
}
