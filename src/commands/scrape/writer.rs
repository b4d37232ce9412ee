use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::model::{
    CapturedSection, FailedTarget, Manifest, NavigationMethod, OUTPUT_STRUCTURE_TREE,
    SITEMAP_FILE, TREE_STRATEGY_DIR, TREE_STRATEGY_ID, coverage_ratio,
};
use crate::route::RouteIdentity;
use crate::util::{ensure_directory, now_utc_string, sha256_hex, write_json_pretty, write_text};

/// Everything known about a section at the moment it is persisted.
#[derive(Debug, Clone)]
pub struct SectionCapture<'a> {
    pub url: &'a str,
    pub route: &'a RouteIdentity,
    pub content: &'a str,
    pub navigation: NavigationMethod,
    pub content_changed: bool,
    pub poll_attempts: u32,
}

/// Persists captured sections under `<domain>/spa-tree/` and accumulates the
/// manifest for the run.
pub struct SectionWriter {
    tree_dir: PathBuf,
    base_url: String,
    sections: Vec<CapturedSection>,
    failed_targets: Vec<FailedTarget>,
    directories: BTreeSet<String>,
}

impl SectionWriter {
    pub fn create(domain_dir: &Path, base_url: &str) -> Result<Self> {
        let tree_dir = domain_dir.join(TREE_STRATEGY_DIR);
        ensure_directory(&tree_dir)?;

        Ok(Self {
            tree_dir,
            base_url: base_url.to_string(),
            sections: Vec::new(),
            failed_targets: Vec::new(),
            directories: BTreeSet::new(),
        })
    }

    /// Write one section file, overwriting any earlier file at the same path.
    pub fn write_section(&mut self, capture: SectionCapture<'_>) -> Result<CapturedSection> {
        let section_segment = capture.route.section_segment();
        let file_name = format!("{}.md", capture.route.subsection_segment());
        let section_dir = self.tree_dir.join(&section_segment);
        ensure_directory(&section_dir)?;

        let header = provenance_header(capture.url, capture.route, &now_utc_string());
        write_text(
            &section_dir.join(&file_name),
            &format!("{header}\n{}", capture.content),
        )?;

        let record = CapturedSection {
            url: capture.url.to_string(),
            section: capture.route.section.clone(),
            subsection: capture.route.subsection.clone(),
            relative_file_path: format!("{section_segment}/{file_name}"),
            byte_size: capture.content.len(),
            navigation: capture.navigation,
            content_changed: capture.content_changed,
            poll_attempts: capture.poll_attempts,
            content_sha256: sha256_hex(capture.content.as_bytes()),
        };

        self.directories.insert(section_segment);
        self.sections.push(record.clone());
        Ok(record)
    }

    pub fn record_failure(&mut self, url: &str, reason: String) {
        self.failed_targets.push(FailedTarget {
            url: url.to_string(),
            reason,
        });
    }

    pub fn captured(&self) -> usize {
        self.sections.len()
    }

    /// Seal the run's manifest.
    pub fn finish(self, total_targets_discovered: usize) -> Manifest {
        let total_captured = self.sections.len();
        Manifest {
            base_url: self.base_url,
            timestamp: now_utc_string(),
            strategy_id: TREE_STRATEGY_ID.to_string(),
            output_structure: OUTPUT_STRUCTURE_TREE.to_string(),
            sections: self.sections,
            failed_targets: self.failed_targets,
            total_targets_discovered,
            total_captured,
            coverage_ratio: coverage_ratio(total_captured, total_targets_discovered),
            directories: self.directories,
        }
    }
}

/// `<domain>/sitemap.json`, next to the strategy directories.
pub fn persist_manifest(domain_dir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let path = domain_dir.join(SITEMAP_FILE);
    write_json_pretty(&path, manifest)?;
    Ok(path)
}

pub fn provenance_header(url: &str, route: &RouteIdentity, captured_at: &str) -> String {
    format!(
        "---\nsource_url: {url}\nsection: {}\nsubsection: {}\nscraped_at: {captured_at}\nscraper: {TREE_STRATEGY_ID}\n---\n",
        route.section, route.subsection
    )
}
