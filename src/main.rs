//! Rental-Harvest main entry point
//!
//! This is the command-line interface for the Rental-Harvest listing harvester.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rental_harvest::config::{load_config_with_hash, Config};
use rental_harvest::crawler::{run_crawl, search_url};
use rental_harvest::diagnostics::{LogSink, MemorySink, TeeSink, TracingSink};
use rental_harvest::gateway::ChromeLauncher;
use rental_harvest::listing::run_scrape;
use rental_harvest::output::{
    print_statistics, read_url_list, write_records, write_url_list, RunStatistics,
};
use rental_harvest::HarvestError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Rental-Harvest: a vacation-rental listing harvester
///
/// Rental-Harvest searches each configured location, collects the listing
/// URLs from every result page, then visits each listing and writes one
/// flat JSON record per listing.
#[derive(Parser, Debug)]
#[command(name = "rental-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A vacation-rental listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only collect listing URLs and write the URL list
    #[arg(long, conflicts_with = "scrape_only")]
    crawl_only: bool,

    /// Only scrape the listings of an existing URL list
    #[arg(long, conflicts_with = "crawl_only")]
    scrape_only: bool,

    /// Validate config and show what would be harvested without opening a browser
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        return handle_dry_run(&config, &cli);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    if !cli.scrape_only {
        handle_crawl(&config, &run_id, cli.quiet).await?;
    }
    if !cli.crawl_only {
        handle_scrape(&config, &run_id, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rental_harvest=info,warn"),
            1 => EnvFilter::new("rental_harvest=debug,info"),
            2 => EnvFilter::new("rental_harvest=trace,debug"),
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

/// Sink for one phase: printed through `tracing` and kept for counting
fn phase_sink(phase: &'static str, run_id: &str, counter: Arc<MemorySink>) -> Arc<dyn LogSink> {
    Arc::new(TeeSink::new(TracingSink::shared(phase, run_id), counter))
}

/// Handles the --dry-run mode: shows the search pages and output paths
fn handle_dry_run(config: &Config, cli: &Cli) -> Result<()> {
    println!("=== Rental-Harvest Dry Run ===\n");

    let base = Url::parse(&config.search.base_url).context("Invalid base-url")?;
    println!("Search pages ({}):", config.search.keywords.len());
    for keyword in &config.search.keywords {
        let url = search_url(&base, keyword)
            .with_context(|| format!("Cannot build search URL for '{}'", keyword))?;
        println!("  - {} -> {}", keyword, url);
    }

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!("  Navigation timeout: {}ms", config.browser.navigation_timeout_ms);
    println!("  Render timeout: {}ms", config.browser.render_timeout_ms);
    println!("  Section timeout: {}ms", config.browser.section_timeout_ms);
    println!("  Settle delay: {}ms", config.browser.settle_delay_ms);
    println!(
        "  Scrolling: {} x {}px, {}ms apart",
        config.browser.scroll_steps, config.browser.scroll_amount, config.browser.scroll_wait_ms
    );
    println!("  Crawl sessions: {}", config.crawler.sessions);

    println!("\nOutput:");
    println!("  URL list: {}", config.output.urls_path);
    println!("  Records: {}", config.output.records_path);

    let phases = match (cli.crawl_only, cli.scrape_only) {
        (true, _) => "crawl",
        (_, true) => "scrape",
        _ => "crawl, then scrape",
    };
    println!("\n✓ Configuration is valid");
    println!("✓ Would run: {}", phases);

    Ok(())
}

/// Closes a phase's statistics with its warning count and duration
fn report_phase(mut stats: RunStatistics, counter: &MemorySink, started: Instant, quiet: bool) {
    stats.warnings = counter.warnings().len() as u64;
    stats.duration_seconds = Some(started.elapsed().as_secs_f64());
    if !quiet {
        print_statistics(&stats);
    }
}

/// Runs the crawl phase, writes the URL list and prints its statistics
async fn handle_crawl(config: &Config, run_id: &str, quiet: bool) -> Result<()> {
    let started = Instant::now();
    let counter = Arc::new(MemorySink::new());
    let sink = phase_sink("crawl", run_id, counter.clone());
    let launcher = ChromeLauncher::from_config(&config.browser);

    let outcome = run_crawl(config, launcher, sink)
        .await
        .context("Crawl failed")?;

    let path = Path::new(&config.output.urls_path);
    let written = write_url_list(&outcome.links, path)
        .with_context(|| format!("Failed to write URL list {}", path.display()))?;
    tracing::info!("Wrote {} URLs to {}", written, path.display());

    let stats = RunStatistics::crawl(config.search.keywords.len(), outcome.harvested, written);
    report_phase(stats, &counter, started, quiet);
    Ok(())
}

/// Reads the URL list, scrapes each listing, writes the records and prints
/// the phase statistics
///
/// Records gathered before a session failure are still written; the failure
/// is returned afterwards.
async fn handle_scrape(config: &Config, run_id: &str, quiet: bool) -> Result<()> {
    let started = Instant::now();
    let path = Path::new(&config.output.urls_path);
    let urls = read_url_list(path)
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;
    if urls.is_empty() {
        tracing::warn!("URL list {} is empty, nothing to scrape", path.display());
        return Ok(());
    }

    let counter = Arc::new(MemorySink::new());
    let sink = phase_sink("scrape", run_id, counter.clone());
    let launcher = ChromeLauncher::from_config(&config.browser);
    let total = urls.len();

    let outcome = run_scrape(config, launcher, urls, sink)
        .await
        .context("Scrape failed")?;

    let records_path = Path::new(&config.output.records_path);
    write_records(&outcome.records, records_path)
        .with_context(|| format!("Failed to write records {}", records_path.display()))?;
    tracing::info!(
        "Wrote {} records to {}",
        outcome.records.len(),
        records_path.display()
    );

    let stats = RunStatistics::scrape(total, outcome.records.len(), outcome.dropped.len());
    report_phase(stats, &counter, started, quiet);

    match outcome.aborted {
        Some(source) => Err(HarvestError::Session(source)).with_context(|| {
            format!(
                "Scrape aborted after {} of {} listings",
                outcome.records.len() + outcome.dropped.len(),
                total
            )
        }),
        None => Ok(()),
    }
}
