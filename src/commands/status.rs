use std::process::ExitCode;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{
    Manifest, NavigationMethod, SITEMAP_FILE, TREE_STRATEGY_DIR, VALIDATION_REPORT_FILE,
    ValidationReport,
};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<ExitCode> {
    let sitemap_path = args.domain_dir.join(SITEMAP_FILE);
    let report_path = args.domain_dir.join(VALIDATION_REPORT_FILE);
    let tree_dir = args.domain_dir.join(TREE_STRATEGY_DIR);

    info!(domain_dir = %args.domain_dir.display(), "status requested");

    if sitemap_path.exists() {
        let manifest: Manifest = read_json(&sitemap_path)?;

        let fallbacks = manifest
            .sections
            .iter()
            .filter(|section| section.navigation == NavigationMethod::FragmentFallback)
            .count();
        let unchanged = manifest
            .sections
            .iter()
            .filter(|section| !section.content_changed)
            .count();

        info!(
            base_url = %manifest.base_url,
            timestamp = %manifest.timestamp,
            strategy = %manifest.strategy_id,
            discovered = manifest.total_targets_discovered,
            captured = manifest.total_captured,
            failed = manifest.failed_targets.len(),
            coverage = %format!("{:.1}%", manifest.coverage_ratio * 100.0),
            directories = manifest.directories.len(),
            navigation_fallbacks = fallbacks,
            unchanged_headings = unchanged,
            "loaded sitemap"
        );
        for failed in &manifest.failed_targets {
            warn!(url = %failed.url, reason = %failed.reason, "target was not captured");
        }
    } else {
        warn!(path = %sitemap_path.display(), "sitemap missing");
    }

    if !tree_dir.is_dir() {
        warn!(path = %tree_dir.display(), "section tree missing");
    }

    if report_path.exists() {
        let report: ValidationReport = read_json(&report_path)?;

        info!(
            generated_at = %report.generated_at,
            complete = %report.overall.complete.join(","),
            incomplete = %report.overall.incomplete.join(","),
            missing = %report.overall.missing.join(","),
            errored = %report.overall.errored.join(","),
            recommendation = %report.overall.recommendation,
            "loaded validation report"
        );
    } else {
        warn!(path = %report_path.display(), "validation report missing");
    }

    Ok(ExitCode::SUCCESS)
}
