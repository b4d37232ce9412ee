use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;

use crate::model::{StrategyMetrics, ValidationReport};

const RULE_WIDTH: usize = 80;

pub fn print_report(report: &ValidationReport, report_path: &Path) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_report(&mut output, report)?;
    writeln!(output, "Full report saved to: {}", report_path.display())?;
    output.flush()?;
    Ok(())
}

pub fn render_report<W: Write>(output: &mut W, report: &ValidationReport) -> Result<()> {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(output, "{rule}")?;
    writeln!(output, "SCRAPER VALIDATION REPORT: {}", report.domain)?;
    writeln!(output, "{rule}")?;

    let truth = &report.ground_truth;
    writeln!(output)?;
    writeln!(output, "Ground truth (from sitemap, {}):", truth.strategy_id)?;
    writeln!(output, "  Sections: {}", truth.sections)?;
    writeln!(output, "  Directories: {}", truth.directories)?;
    writeln!(output, "  Coverage: {}", percent(truth.coverage))?;

    writeln!(output)?;
    writeln!(output, "Strategy results:")?;
    for (name, strategy) in &report.strategies {
        writeln!(output)?;
        writeln!(
            output,
            "  [{}] {}",
            strategy.verdict.as_str(),
            name.to_uppercase()
        )?;

        match &strategy.metrics {
            Some(StrategyMetrics::Mirror {
                html_files,
                total_files,
                subdirectories,
                ..
            }) => {
                writeln!(output, "    HTML files: {html_files} (of {total_files})")?;
                writeln!(output, "    Subdirectories: {subdirectories}")?;
            }
            Some(StrategyMetrics::Document {
                lines,
                sections_detected,
                expected_sections,
                coverage,
            }) => {
                writeln!(output, "    Lines: {lines}")?;
                writeln!(output, "    Sections: {sections_detected}/{expected_sections}")?;
                writeln!(output, "    Coverage: {}", percent(*coverage))?;
            }
            Some(StrategyMetrics::Tree {
                markdown_files,
                directories,
                coverage,
                ..
            }) => {
                writeln!(output, "    Files: {markdown_files}")?;
                writeln!(output, "    Directories: {directories}")?;
                writeln!(output, "    Coverage: {}", percent(*coverage))?;
            }
            None => {}
        }
        if let Some(notes) = &strategy.notes {
            writeln!(output, "    Notes: {notes}")?;
        }
    }

    writeln!(output)?;
    writeln!(output, "Recommendation:")?;
    writeln!(output, "  {}", report.overall.recommendation)?;

    if !report.overall.incomplete.is_empty() {
        writeln!(output)?;
        writeln!(
            output,
            "Incomplete strategies: {}",
            report.overall.incomplete.join(", ")
        )?;
        writeln!(output, "  These strategies failed to capture complete content.")?;
    }
    if !report.overall.errored.is_empty() {
        writeln!(output)?;
        writeln!(
            output,
            "Unreadable strategies: {}",
            report.overall.errored.join(", ")
        )?;
    }

    writeln!(output)?;
    writeln!(output, "{rule}")?;
    Ok(())
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
