//! Kumo-Frontier main entry point
//!
//! A small operational CLI around the scheduler core: validate
//! configuration, seed the frontier, and inspect scheduler state.

use anyhow::Context;
use clap::Parser;
use kumo_frontier::config::load_config_with_hash;
use kumo_frontier::CrawlScheduler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Kumo-Frontier: adaptive crawl scheduler core
#[derive(Parser, Debug)]
#[command(name = "kumo-frontier")]
#[command(version = "1.0.0")]
#[command(about = "Adaptive crawl scheduler core", long_about = None)]
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

    /// Validate config and show what would be scheduled without opening the store
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Print scheduler statistics from the existing store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let scheduler = CrawlScheduler::open(&config.scheduler)?;

    if cli.stats {
        print_stats(&scheduler);
        return Ok(());
    }

    let report = scheduler.seed(&config.seeds);
    tracing::info!(
        "seeded frontier: {} admitted, {} filtered, {} rejected",
        report.admitted,
        report.filtered,
        report.rejected.len()
    );

    print_stats(&scheduler);
    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kumo_frontier=info,warn"),
            1 => EnvFilter::new("kumo_frontier=debug,info"),
            2 => EnvFilter::new("kumo_frontier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Handles --dry-run: show the effective configuration without side effects
fn handle_dry_run(config: &kumo_frontier::config::Config) {
    println!("=== Kumo-Frontier Dry Run ===\n");

    println!("Scheduler configuration:");
    println!("  Max queue size: {}", config.scheduler.max_queue_size);
    println!("  Max depth: {}", config.scheduler.max_depth);
    println!("  Metadata store: {}", config.scheduler.metadata_db_path);
    println!(
        "  Persistence: every {}ms, batches of {}",
        config.scheduler.persistence_batch_period_ms, config.scheduler.persistence_batch_size
    );
    if let Some(path) = &config.scheduler.blacklist_path {
        println!("  Blacklist file: {}", path);
    }
    if let Some(path) = &config.scheduler.domain_config_path {
        println!("  Domain config file: {}", path);
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  {}", seed);
    }
}

/// Prints scheduler statistics
fn print_stats(scheduler: &CrawlScheduler) {
    let stats = scheduler.stats();
    println!("Frontier: {} queued, {} shards ready", stats.frontier_size, stats.frontier_ready);
    println!(
        "Metadata: {} tracked URLs, {} ready to crawl",
        stats.tracked_urls, stats.tracked_ready
    );
}
