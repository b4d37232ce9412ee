use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{info, warn};

use super::ValidateError;
use super::recommendation::summarize;
use super::report::print_report;
use super::strategies::{check_document, check_mirror, check_tree, errored, missing};
use crate::cli::ValidateArgs;
use crate::model::{
    DOCUMENT_STRATEGY_DIR, GroundTruth, MIRROR_STRATEGY_DIR, Manifest, SITEMAP_FILE,
    StrategyReport, TREE_STRATEGY_DIR, VALIDATION_REPORT_FILE, ValidationReport,
};
use crate::util::{now_utc_string, write_json_pretty};

type StrategyCheck = fn(&Path, usize) -> Result<StrategyReport>;

pub fn run(args: ValidateArgs) -> Result<ExitCode> {
    info!(domain_dir = %args.domain_dir.display(), "validation requested");

    let report = validate_domain(&args.domain_dir)?;

    let report_path = args.domain_dir.join(VALIDATION_REPORT_FILE);
    write_json_pretty(&report_path, &report)?;
    print_report(&report, &report_path)?;

    info!(
        complete = report.overall.complete.len(),
        incomplete = report.overall.incomplete.len(),
        missing = report.overall.missing.len(),
        errored = report.overall.errored.len(),
        report = %report_path.display(),
        "validation complete"
    );

    if report.overall.complete.is_empty() {
        warn!(recommendation = %report.overall.recommendation, "no strategy is complete");
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

/// Build the report for `domain_dir` without writing anything.
pub fn validate_domain(domain_dir: &Path) -> Result<ValidationReport> {
    if !domain_dir.is_dir() {
        return Err(ValidateError::DomainMissing {
            path: domain_dir.to_path_buf(),
        }
        .into());
    }

    let manifest = load_manifest(domain_dir)?;
    let expected = manifest.total_captured;
    info!(
        sections = expected,
        directories = manifest.directories.len(),
        strategy = %manifest.strategy_id,
        "loaded sitemap ground truth"
    );

    let checks: [(&str, StrategyCheck); 3] = [
        (MIRROR_STRATEGY_DIR, check_mirror),
        (DOCUMENT_STRATEGY_DIR, check_document),
        (TREE_STRATEGY_DIR, check_tree),
    ];
    let strategies = checks
        .into_iter()
        .map(|(name, check)| {
            let report = inspect(name, &domain_dir.join(name), expected, check);
            (name.to_string(), report)
        })
        .collect::<BTreeMap<String, StrategyReport>>();

    let overall = summarize(&strategies);

    Ok(ValidationReport {
        domain: domain_name(domain_dir),
        generated_at: now_utc_string(),
        ground_truth: GroundTruth {
            sections: expected,
            directories: manifest.directories.len(),
            coverage: manifest.coverage_ratio,
            strategy_id: manifest.strategy_id,
        },
        strategies,
        overall,
    })
}

pub fn load_manifest(domain_dir: &Path) -> Result<Manifest, ValidateError> {
    let path = domain_dir.join(SITEMAP_FILE);
    if !path.is_file() {
        return Err(ValidateError::ManifestMissing { path });
    }

    let raw = fs::read(&path).map_err(|err| ValidateError::ManifestUnreadable {
        path: path.clone(),
        reason: err.to_string(),
    })?;
    serde_json::from_slice(&raw).map_err(|err| ValidateError::ManifestUnreadable {
        path,
        reason: err.to_string(),
    })
}

fn inspect(name: &str, root: &Path, expected: usize, check: StrategyCheck) -> StrategyReport {
    if !root.exists() {
        info!(strategy = name, "strategy output missing");
        return missing();
    }

    match check(root, expected) {
        Ok(report) => {
            info!(
                strategy = name,
                verdict = report.verdict.as_str(),
                "strategy checked"
            );
            report
        }
        Err(err) => {
            warn!(strategy = name, error = %format!("{err:#}"), "strategy check failed");
            errored(format!("{err:#}"))
        }
    }
}

fn domain_name(domain_dir: &Path) -> String {
    let canonical = fs::canonicalize(domain_dir).ok();
    canonical
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| domain_dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| domain_dir.display().to_string())
}
