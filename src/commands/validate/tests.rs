use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::ValidateError;
use super::recommendation::{recommend, summarize};
use super::report::render_report;
use super::run::{load_manifest, validate_domain};
use super::strategies::{
    DocumentFormat, check_document, check_mirror, check_tree, meets_threshold, parse_document,
};
use crate::model::{
    Manifest, StrategyMetrics, StrategyReport, VALIDATION_REPORT_FILE, Verdict,
};
use crate::util::write_json_pretty;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

fn seed_sitemap(domain: &Path, captured: usize) {
    let manifest = Manifest {
        base_url: "https://docs.example/app".to_string(),
        strategy_id: "spa-tree-cdp".to_string(),
        total_targets_discovered: captured,
        total_captured: captured,
        coverage_ratio: 1.0,
        directories: ["guide", "api", "faq"].iter().map(|name| name.to_string()).collect(),
        ..Manifest::default()
    };
    write_json_pretty(&domain.join("sitemap.json"), &manifest).expect("sitemap");
}

fn seed_tree(domain: &Path, files: usize) {
    for index in 0..files {
        let section = ["guide", "api", "faq"][index % 3];
        write(
            &domain.join("spa-tree").join(section).join(format!("page{index}.md")),
            "---\nsource_url: x\n---\n\nbody",
        );
    }
}

fn tree_files(report: &StrategyReport) -> usize {
    match report.metrics {
        Some(StrategyMetrics::Tree { markdown_files, .. }) => markdown_files,
        ref other => panic!("expected tree metrics, got {other:?}"),
    }
}

#[test]
fn tree_with_nine_of_ten_sections_is_complete() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_tree(dir.path(), 9);

    let report = check_tree(&dir.path().join("spa-tree"), 10).expect("check");
    assert_eq!(report.verdict, Verdict::Complete);
    assert_eq!(tree_files(&report), 9);
    match report.metrics {
        Some(StrategyMetrics::Tree {
            directories,
            coverage,
            ..
        }) => {
            assert_eq!(directories, 3);
            assert!((coverage - 0.9).abs() < 1e-9);
        }
        ref other => panic!("unexpected metrics {other:?}"),
    }
}

#[test]
fn tree_with_seven_of_ten_sections_is_incomplete() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_tree(dir.path(), 7);

    let report = check_tree(&dir.path().join("spa-tree"), 10).expect("check");
    assert_eq!(report.verdict, Verdict::Incomplete);
    assert_eq!(tree_files(&report), 7);
}

#[test]
fn thresholds_compare_against_scaled_ground_truth() {
    assert!(meets_threshold(8, 10, 0.8));
    assert!(!meets_threshold(7, 10, 0.8));
    assert!(meets_threshold(9, 10, 0.9));
    assert!(!meets_threshold(8, 10, 0.9));
    assert!(meets_threshold(0, 0, 0.9));
}

#[test]
fn plain_markdown_with_five_level_two_headings_is_half_covered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("crawl4ai");
    let body = (1..=5)
        .map(|index| format!("## Section {index}\n\ntext\n### detail\n"))
        .collect::<String>();
    write(&root.join("content.md"), &format!("# Title\n{body}"));

    let report = check_document(&root, 10).expect("check");
    assert_eq!(report.verdict, Verdict::Incomplete);
    assert_eq!(report.notes.as_deref(), Some("Plain markdown format"));
    match report.metrics {
        Some(StrategyMetrics::Document {
            sections_detected,
            expected_sections,
            coverage,
            ..
        }) => {
            assert_eq!(sections_detected, 5);
            assert_eq!(expected_sections, 10);
            assert!((coverage - 0.5).abs() < 1e-9);
        }
        ref other => panic!("unexpected metrics {other:?}"),
    }
}

#[test]
fn structured_document_reads_raw_markdown_field() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("crawl4ai");
    let markdown = (1..=4).map(|index| format!("## S{index}\n")).collect::<String>();
    let json = serde_json::json!({ "markdown": { "raw_markdown": markdown } });
    write(&root.join("content.md"), &json.to_string());

    let report = check_document(&root, 5).expect("check");
    assert_eq!(report.verdict, Verdict::Complete);
    assert_eq!(report.notes.as_deref(), Some("TOC-only capture"));
}

#[test]
fn document_without_raw_markdown_or_text_is_an_error_verdict() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("crawl4ai");
    write(&root.join("content.md"), r#"{"markdown": {"fit": "x"}}"#);

    let report = check_document(&root, 5).expect("check");
    assert_eq!(report.verdict, Verdict::Error);
    assert!(report.exists);

    let path = root.join("content.md");
    assert!(parse_document(&path, &[0xff, 0xfe, 0x00]).is_err());
    let (text, format) = parse_document(&path, b"[1, 2]").expect("non-object JSON is text");
    assert_eq!(text, "[1, 2]");
    assert_eq!(format, DocumentFormat::Plain);
}

#[test]
fn document_directory_without_content_file_is_an_error_verdict() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("crawl4ai");
    fs::create_dir_all(&root).expect("create");

    let report = check_document(&root, 5).expect("check");
    assert_eq!(report.verdict, Verdict::Error);
    assert!(report.exists);
    assert!(report.metrics.is_none());
}

#[test]
fn mirror_skips_tool_artifacts_and_detects_tree_structure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("httrack");
    write(&root.join("index.html"), "<html></html>");
    write(&root.join("hts-cache/new.html"), "<html></html>");
    for section in ["guide", "api", "faq"] {
        for page in 0..2 {
            write(&root.join(section).join(format!("p{page}.html")), "<html></html>");
        }
    }
    write(&root.join("api/index.html"), "<html></html>");

    let report = check_mirror(&root, 10).expect("check");
    match report.metrics {
        Some(StrategyMetrics::Mirror {
            html_files,
            total_files,
            subdirectories,
            has_tree_structure,
            ..
        }) => {
            assert_eq!(html_files, 6);
            assert_eq!(total_files, 9);
            assert_eq!(subdirectories, 3);
            assert!(has_tree_structure);
        }
        ref other => panic!("unexpected metrics {other:?}"),
    }
    assert_eq!(report.verdict, Verdict::Incomplete);
    assert_eq!(
        report.notes.as_deref(),
        Some("Full HTML mirror with tree structure (3 sections)")
    );
}

#[test]
fn mirror_with_only_the_app_shell_is_flagged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("httrack");
    write(&root.join("index.html"), "<html></html>");
    write(&root.join("app.html"), "<html></html>");

    let report = check_mirror(&root, 10).expect("check");
    assert_eq!(report.verdict, Verdict::Incomplete);
    assert_eq!(report.notes.as_deref(), Some("React SPA shell (no content)"));
}

fn seed_mirror(root: &Path, pages: usize) {
    write(&root.join("index.html"), "<html></html>");
    for index in 0..pages {
        let section = ["guide", "api", "faq"][index % 3];
        write(
            &root.join(section).join(format!("page{index}.html")),
            "<html></html>",
        );
    }
}

#[test]
fn mirror_with_nine_of_ten_pages_is_complete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("httrack");
    seed_mirror(&root, 9);

    let report = check_mirror(&root, 10).expect("check");
    assert_eq!(report.verdict, Verdict::Complete);
    match report.metrics {
        Some(StrategyMetrics::Mirror {
            html_files,
            total_files,
            coverage,
            ..
        }) => {
            assert_eq!(html_files, 9);
            assert_eq!(total_files, 10);
            assert!((coverage - 0.9).abs() < 1e-9);
        }
        ref other => panic!("unexpected metrics {other:?}"),
    }
}

#[test]
fn mirror_with_seven_of_ten_pages_is_incomplete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("httrack");
    seed_mirror(&root, 7);

    let report = check_mirror(&root, 10).expect("check");
    assert_eq!(report.verdict, Verdict::Incomplete);
    match report.metrics {
        Some(StrategyMetrics::Mirror { html_files, .. }) => assert_eq!(html_files, 7),
        ref other => panic!("unexpected metrics {other:?}"),
    }
}

#[test]
fn every_completeness_combination_has_a_recommendation() {
    let mut seen = std::collections::BTreeSet::new();
    for tree in [false, true] {
        for document in [false, true] {
            for mirror in [false, true] {
                let recommendation = recommend(tree, document, mirror);
                assert!(!recommendation.is_empty());
                assert_eq!(recommend(tree, document, mirror), recommendation);
                if tree {
                    assert!(recommendation.contains("spa-tree/ for curation"));
                }
                seen.insert(recommendation);
            }
        }
    }
    assert!(seen.len() >= 6);
    assert!(recommend(false, false, false).contains("Manual review required"));
}

#[test]
fn all_verdict_combinations_summarize_without_gaps() {
    let verdicts = [Verdict::Complete, Verdict::Incomplete, Verdict::Missing];
    for tree in verdicts {
        for document in verdicts {
            for mirror in verdicts {
                let strategies = [("spa-tree", tree), ("crawl4ai", document), ("httrack", mirror)]
                    .into_iter()
                    .map(|(name, verdict)| {
                        (
                            name.to_string(),
                            StrategyReport {
                                exists: verdict != Verdict::Missing,
                                verdict,
                                metrics: None,
                                notes: None,
                            },
                        )
                    })
                    .collect::<BTreeMap<String, StrategyReport>>();
                let overall = summarize(&strategies);
                assert!(!overall.recommendation.is_empty());
                assert_eq!(
                    overall.complete.len() + overall.incomplete.len() + overall.missing.len(),
                    3
                );
            }
        }
    }
}

#[test]
fn domain_report_combines_every_strategy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let domain = dir.path().join("docs.example");
    seed_sitemap(&domain, 10);
    seed_tree(&domain, 10);
    write(&domain.join("crawl4ai/content.md"), "# only a title\n");

    let report = validate_domain(&domain).expect("validate");
    assert_eq!(report.domain, "docs.example");
    assert_eq!(report.ground_truth.sections, 10);
    assert_eq!(report.ground_truth.directories, 3);
    assert_eq!(report.strategies["spa-tree"].verdict, Verdict::Complete);
    assert_eq!(report.strategies["crawl4ai"].verdict, Verdict::Incomplete);
    assert_eq!(report.strategies["httrack"].verdict, Verdict::Missing);
    assert_eq!(report.overall.complete, vec!["spa-tree".to_string()]);
    assert_eq!(report.overall.missing, vec!["httrack".to_string()]);
    assert!(report.overall.recommendation.contains("only complete source"));

    let mut rendered = Vec::new();
    render_report(&mut rendered, &report).expect("render");
    let text = String::from_utf8(rendered).expect("utf8");
    assert!(text.contains("SCRAPER VALIDATION REPORT: docs.example"));
    assert!(text.contains("[COMPLETE] SPA-TREE"));
    assert!(text.contains("Incomplete strategies: crawl4ai"));
}

#[test]
fn missing_sitemap_is_a_distinct_error_and_leaves_report_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let domain = dir.path();
    seed_tree(domain, 3);
    let report_path = domain.join(VALIDATION_REPORT_FILE);
    write(&report_path, "previous");

    let err = validate_domain(domain).expect_err("sitemap is absent");
    assert!(matches!(
        err.downcast_ref::<ValidateError>(),
        Some(ValidateError::ManifestMissing { .. })
    ));
    assert!(matches!(
        load_manifest(domain),
        Err(ValidateError::ManifestMissing { .. })
    ));
    assert_eq!(fs::read_to_string(&report_path).expect("report"), "previous");
}

#[test]
fn malformed_sitemap_and_missing_domain_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("sitemap.json"), "{not json");
    assert!(matches!(
        load_manifest(dir.path()),
        Err(ValidateError::ManifestUnreadable { .. })
    ));

    let err = validate_domain(&dir.path().join("absent")).expect_err("no domain");
    assert!(matches!(
        err.downcast_ref::<ValidateError>(),
        Some(ValidateError::DomainMissing { .. })
    ));
}
