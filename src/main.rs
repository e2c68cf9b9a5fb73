//! Seller-Census main entry point
//!
//! This is the command-line interface for the Seller-Census harvester.

use anyhow::Context;
use clap::Parser;
use seller_census::config::{load_config_with_hash, Config, ConfigOverrides, FetchMode};
use seller_census::harvest::{harvest, pending_ids, RunPlan, ShutdownSignal};
use seller_census::output::{ledger_statistics, print_statistics};
use seller_census::storage::JsonLedger;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Seller-Census: a resumable marketplace seller directory harvester
///
/// Walks a seller-id range, fetches each seller's business name, VAT number,
/// registered address and shipping origin, and appends the results to a CSV
/// file. Progress is kept in a JSON ledger so interrupted runs resume where
/// they stopped.
#[derive(Parser, Debug)]
#[command(name = "seller-census")]
#[command(version)]
#[command(about = "A resumable seller directory harvester", long_about = None)]
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

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the progress ledger and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// First seller id (overrides [range].from)
    #[arg(long)]
    from: Option<u64>,

    /// Last seller id, inclusive (overrides [range].to)
    #[arg(long)]
    to: Option<u64>,

    /// Pause between batches in milliseconds (overrides [pacing].delay-ms)
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Fetches per batch; 1 is serial (overrides [pacing].concurrency)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Upstream to use: api or html (overrides [fetch].mode)
    #[arg(long)]
    mode: Option<FetchMode>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            from: self.from,
            to: self.to,
            delay_ms: self.delay,
            concurrency: self.concurrency,
            mode: self.mode,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    cli.overrides()
        .apply(&mut config)
        .context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_harvest(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seller_census=info,warn"),
            1 => EnvFilter::new("seller_census=debug,info"),
            2 => EnvFilter::new("seller_census=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved plan without fetching
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let ledger = JsonLedger::open(&config.output.progress_path)
        .context("cannot read progress ledger")?;
    let plan = RunPlan::from_config(config);
    let pending = pending_ids(plan.range.clone(), &ledger);

    println!("=== Seller-Census Dry Run ===\n");

    println!("Range:");
    println!("  Ids: {}..={}", plan.range.start(), plan.range.end());
    println!("  Already recorded: {}", plan.range_len() - pending.len() as u64);
    println!("  Pending: {}", pending.len());

    println!("\nPacing:");
    println!("  Concurrency: {}", plan.concurrency);
    println!("  Delay between batches: {}ms", config.pacing.delay_ms);
    println!("  Ledger flush every: {} ids", plan.flush_every);

    println!("\nFetch:");
    println!("  Mode: {}", config.fetch.mode);
    match config.fetch.mode {
        FetchMode::Api => println!("  Endpoint: {}/{{id}}", config.api.base_url),
        FetchMode::Html => println!("  Page: {}", config.html.url_template),
    }
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Results: {}", config.output.csv_path);
    println!("  Progress: {}", config.output.progress_path);

    println!("\n✓ Configuration is valid");
    if let (Some(first), Some(last)) = (pending.first(), pending.last()) {
        println!("✓ Would fetch {} ids, from {} to {}", pending.len(), first, last);
    } else {
        println!("✓ Nothing to fetch, every id in range is recorded");
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the progress ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Ledger: {}\n", config.output.progress_path);

    let ledger = JsonLedger::open(&config.output.progress_path)
        .context("cannot read progress ledger")?;
    let stats = ledger_statistics(ledger.entries());
    print_statistics(&stats);

    Ok(())
}

/// Handles a normal harvest run
async fn handle_harvest(config: &Config) -> anyhow::Result<()> {
    let shutdown = ShutdownSignal::new();
    let listener = shutdown.listen_for_ctrl_c();

    let result = harvest(config, shutdown).await;
    listener.abort();

    let summary = result.context("harvest aborted")?;
    if !summary.interrupted {
        println!(
            "Done: {} found, {} empty, {} errors",
            summary.found, summary.empty, summary.errored
        );
    }

    Ok(())
}
