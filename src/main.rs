//! Emote Sniper main entry point
//!
//! This is the command-line interface for the incremental catalog crawler.

use anyhow::Context;
use clap::Parser;
use emote_sniper::config::{load_config_with_hash, validate, Config};
use emote_sniper::crawler::crawl;
use emote_sniper::output::{load_statistics, print_run_report, print_statistics};
use emote_sniper::storage::open_storage;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Emote Sniper: an incremental catalog crawler
///
/// Scans the item catalog across several query configurations and keeps a
/// deduplicated JSON snapshot of every emote ever seen. Meant to be run
/// periodically from a scheduler.
#[derive(Parser, Debug)]
#[command(name = "emote-sniper")]
#[command(version)]
#[command(about = "An incremental catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in catalog setup if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the snapshot path from the configuration
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Replace bundle ids with the animation id they contain
    #[arg(long)]
    resolve_bundles: bool,

    /// Look up names the catalog leaves empty
    #[arg(long)]
    lookup_names: bool,

    /// Show the effective configuration without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the snapshot and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using built-in catalog setup");
            Config::default()
        }
    };

    if let Some(output) = &cli.output {
        config.output.snapshot_path = output.display().to_string();
    }
    config.resolver.resolve_bundles |= cli.resolve_bundles;
    config.resolver.lookup_names |= cli.lookup_names;
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("emote_sniper=info,warn"),
            1 => EnvFilter::new("emote_sniper=debug,info"),
            2 => EnvFilter::new("emote_sniper=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Emote Sniper Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Catalog path: {}", config.crawler.catalog_path);
    println!("  Max pages per config: {}", config.crawler.max_pages_per_config);
    println!("  Max empty pages: {}", config.crawler.max_empty_pages);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Config delay: {}ms", config.crawler.config_delay_ms);
    println!("  Rate limit delay: {}ms", config.crawler.rate_limit_delay_ms);
    println!("  Probe timeout: {}s", config.crawler.probe_timeout_secs);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Snapshot: {}", config.output.snapshot_path);

    println!("\nEndpoints ({}):", config.endpoints.len());
    for (priority, entry) in config.endpoints.iter().enumerate() {
        println!("  {}. {}", priority + 1, entry.base_url);
    }

    println!("\nQuery Configurations ({}):", config.queries.len());
    for query in &config.queries {
        let params: Vec<String> = query
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("  - {}: {}", query.label, params.join("&"));
    }

    println!("\nResolver:");
    println!("  Resolve bundles: {}", config.resolver.resolve_bundles);
    println!("  Lookup names: {}", config.resolver.lookup_names);
    println!("  Track bundle ids: {}", config.resolver.track_bundle_ids);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the snapshot
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(std::path::Path::new(&config.output.snapshot_path));
    println!("Snapshot: {}\n", storage.path().display());

    let snapshot = storage
        .read()
        .with_context(|| format!("failed to read {}", storage.path().display()))?
        .unwrap_or_default();

    print_statistics(&load_statistics(&snapshot));
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting emote sniper: {} endpoints, {} query configurations",
        config.endpoints.len(),
        config.queries.len()
    );

    match crawl(config).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_run_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
