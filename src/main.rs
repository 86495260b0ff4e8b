//! Prospector command-line interface
//!
//! Runs a crawl job against a named site profile or a JSON profile path
//! and reports the outcome: counters and errors to the console, products
//! optionally to a JSON file.

use anyhow::Context;
use clap::Parser;
use prospector::crawler::{CrawlLimits, CrawlOptions, CrawlOutcome, Orchestrator};
use prospector::profile::load_profile;
use prospector::store::MemoryStore;
use prospector::ProspectorError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Prospector: a site-agnostic product crawler
///
/// Given a start URL and an extraction profile, Prospector discovers
/// listing pages, follows pagination, and extracts structured product
/// records, respecting robots.txt and rate limits.
#[derive(Parser, Debug)]
#[command(name = "prospector")]
#[command(version = "1.0.0")]
#[command(about = "A site-agnostic product crawler", long_about = None)]
struct Cli {
    /// Name of a site profile in the profiles directory
    #[arg(long, conflicts_with = "profile")]
    site: Option<String>,

    /// Path to a JSON extraction profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Directory searched for named site profiles
    #[arg(long, default_value = "./profiles")]
    profiles_dir: PathBuf,

    /// Starting URL (overrides the profile's start URLs)
    #[arg(long)]
    url: Option<String>,

    /// Maximum number of products to extract
    #[arg(long)]
    limit: Option<usize>,

    /// Maximum number of listing pages to traverse
    #[arg(long, default_value_t = 10)]
    max_pages: usize,

    /// Number of concurrent requests
    #[arg(long, default_value_t = 2)]
    concurrency: usize,

    /// Delay between requests in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay: u64,

    /// Maximum fetch attempts per URL
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 10000)]
    timeout: u64,

    /// User agent string sent with every request
    #[arg(long, default_value = "Prospector/1.0")]
    user_agent: String,

    /// Whether to respect robots.txt rules
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    robots: bool,

    /// Disable selector inference for profiles with missing selectors
    #[arg(long)]
    no_infer: bool,

    /// Hand extracted products to the in-memory store, making
    /// insert/update accounting live
    #[arg(long)]
    persist: bool,

    /// Write extracted products to a JSON file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let profile_path = resolve_profile_path(&cli)?;
    tracing::info!("Loading profile from: {}", profile_path.display());
    let profile = load_profile(&profile_path)
        .with_context(|| format!("failed to load profile {}", profile_path.display()))?;

    let limits = CrawlLimits {
        max_products: cli.limit,
        max_pages: cli.max_pages,
        concurrency: cli.concurrency,
        request_delay_ms: cli.delay,
        max_retries: cli.retries,
        timeout_ms: cli.timeout,
    };

    let options = CrawlOptions {
        user_agent: cli.user_agent.clone(),
        respect_robots: cli.robots,
        infer_selectors: !cli.no_infer,
    };

    let start_urls = cli.url.clone().into_iter().collect::<Vec<_>>();
    let job = prospector::crawler::CrawlJob::new(profile, limits, start_urls);

    if job.start_urls.is_empty() {
        anyhow::bail!("no start URL: pass --url or add startUrls to the profile");
    }

    let mut orchestrator = Orchestrator::new(job, options)?;
    if cli.persist {
        orchestrator = orchestrator.with_store(Arc::new(MemoryStore::new()));
    }

    let outcome = orchestrator.run().await?;

    print_summary(&outcome);

    if let Some(output) = &cli.output {
        write_products(&outcome, output)?;
        println!("Products written to {}", output.display());
    }

    if outcome.is_fatal() {
        let message = outcome
            .job
            .last_error
            .clone()
            .unwrap_or_else(|| "fatal job failure".to_string());
        return Err(ProspectorError::JobFatal(message).into());
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("prospector=info,warn"),
            1 => EnvFilter::new("prospector=debug,info"),
            2 => EnvFilter::new("prospector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves --site or --profile into a profile path
fn resolve_profile_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.profile {
        return Ok(path.clone());
    }
    if let Some(site) = &cli.site {
        return Ok(cli.profiles_dir.join(format!("{}.json", site)));
    }
    anyhow::bail!("specify a site (--site NAME) or a profile file (--profile PATH)")
}

/// Prints the job outcome: terminal state, counters, and per-page errors
fn print_summary(outcome: &CrawlOutcome) {
    let job = &outcome.job;

    println!("\n=== Crawl {} ===", job.id);
    println!("Status:           {:?}", job.status);
    println!("Pages crawled:    {}", job.counters.pages_crawled);
    println!("Products found:   {}", job.counters.products_found);
    println!("Products added:   {}", job.counters.products_added);
    println!("Products updated: {}", job.counters.products_updated);
    println!("Robots skips:     {}", outcome.robots_denied);

    if let (Some(started), Some(ended)) = (job.started_at, job.ended_at) {
        println!("Duration:         {}", ended - started);
    }

    if !outcome.errors.is_empty() {
        println!("\n{} page error(s):", outcome.errors.len());
        for error in &outcome.errors {
            println!("  [{:?}] {}: {}", error.phase, error.url, error.message);
        }
    }
}

/// Writes the extracted products as pretty-printed JSON
fn write_products(outcome: &CrawlOutcome, path: &PathBuf) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&outcome.products)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
