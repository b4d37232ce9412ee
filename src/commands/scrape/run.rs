use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::TargetState;
use super::driver::crawl;
use super::writer::{SectionWriter, persist_manifest};
use crate::browser::Browser;
use crate::cli::ScrapeArgs;
use crate::config::ScrapeConfig;

pub fn run(args: ScrapeArgs) -> Result<ExitCode> {
    let config = ScrapeConfig::from_env();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(scrape(&args, &config))
}

async fn scrape(args: &ScrapeArgs, config: &ScrapeConfig) -> Result<ExitCode> {
    info!(
        url = %args.base_url,
        output = %args.output_dir.display(),
        "starting navigation run"
    );

    let mut writer = SectionWriter::create(&args.output_dir, &args.base_url)?;

    let (browser, mut page) = Browser::launch(&config.launch)
        .await
        .context("failed to start browser session")?;

    let crawled = crawl(&mut page, &args.base_url, &mut writer, config.timing).await;
    drop(page);
    browser.close().await;
    let outcomes = crawled?;

    let manifest = writer.finish(outcomes.len());
    let sitemap_path = persist_manifest(&args.output_dir, &manifest)?;

    let errored = outcomes
        .iter()
        .filter(|outcome| outcome.state == TargetState::Errored)
        .count();
    let warned = outcomes
        .iter()
        .filter(|outcome| outcome.state == TargetState::Written && !outcome.warnings.is_empty())
        .count();
    if errored > 0 {
        warn!(errored, "some targets could not be captured");
    }

    info!(
        directories = manifest.directories.len(),
        files = manifest.total_captured,
        with_warnings = warned,
        coverage = %format!("{:.1}%", manifest.coverage_ratio * 100.0),
        sitemap = %sitemap_path.display(),
        "navigation run complete"
    );

    Ok(ExitCode::SUCCESS)
}
