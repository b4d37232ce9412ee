use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "spa-docs-sync",
    version,
    about = "Snapshot hash-routed documentation SPAs and cross-check capture strategies"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a live browser through every navigation target and write a section tree.
    Scrape(ScrapeArgs),
    /// Compare every strategy's output against the sitemap ground truth.
    Validate(ValidateArgs),
    /// Summarize the sitemap and the last validation report of a domain root.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Documentation entry point, e.g. https://example.com/docs
    pub base_url: String,

    /// Domain output root; receives `sitemap.json` and the section tree.
    pub output_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Domain output root produced by `scrape` and the alternate strategies.
    pub domain_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    pub domain_dir: PathBuf,
}
