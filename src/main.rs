//! Trawler main entry point
//!
//! This is the command-line interface for the trawler crawl engine.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use trawler::config::{load_config, load_flagged_words, load_seed_urls, QueueBackend};
use trawler::pipeline::{
    run_pipeline, AnalyzerRegistry, BrowserTransport, HttpTransport, Transport,
};
use trawler::queue::{MemoryQueueStore, QueueStore, RedisQueueStore};
use trawler::storage::SqliteStorage;
use trawler::{Frontier, PipelineContext};
use tracing_subscriber::EnvFilter;

/// Trawler: a priority-tiered crawl frontier and pipeline engine
///
/// Trawler pops URLs from a durable tiered frontier, fetches and
/// fingerprints their content, extracts and scores outbound links, and
/// feeds new discoveries back into the frontier.
#[derive(Parser, Debug)]
#[command(name = "trawler")]
#[command(version)]
#[command(about = "A priority-tiered crawl frontier and pipeline engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Number of parallel worker sets (overrides the config file)
    #[arg(short = 'n', long)]
    worker_sets: Option<u32>,

    /// Fetch pages through a scripted browser instead of plain HTTP
    #[arg(long)]
    browser: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Grace period granted to in-flight fetches after a termination signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)?;
    if let Some(n) = cli.worker_sets {
        config.crawler.worker_sets = n;
    }
    if cli.browser {
        config.fetch.use_browser = true;
    }

    let flagged_words = load_flagged_words(Path::new(&config.input.flagged_words_path))
        .context("loading flagged-word list")?;
    let seeds = load_seed_urls(Path::new(&config.input.seeds_path))
        .context("loading seed URL list")?;
    tracing::info!(
        "Loaded {} flagged words and {} seed URLs",
        flagged_words.len(),
        seeds.len()
    );

    let storage = Arc::new(Mutex::new(
        SqliteStorage::new(Path::new(&config.storage.database_path))
            .context("opening database")?,
    ));

    let queue: Arc<dyn QueueStore> = match config.queue.backend {
        QueueBackend::Redis => Arc::new(
            RedisQueueStore::connect(&config.queue.redis_url)
                .await
                .context("connecting to Redis")?,
        ),
        QueueBackend::Memory => Arc::new(MemoryQueueStore::new()),
    };

    let timeout = Duration::from_millis(config.fetch.request_timeout_ms);
    let transport: Arc<dyn Transport> = if config.fetch.use_browser {
        tracing::info!("Using scripted-browser fetch transport");
        Arc::new(
            BrowserTransport::launch(timeout, config.fetch.max_response_size)
                .await
                .context("launching browser")?,
        )
    } else {
        Arc::new(
            HttpTransport::new(timeout, config.fetch.max_response_size)
                .context("building HTTP client")?,
        )
    };

    // Seed URLs enter the highest configured tier so they are fetched
    // before anything the crawl discovers.
    let seed_tier = config
        .crawler
        .fetch_tiers
        .iter()
        .copied()
        .max()
        .expect("validated: tier list is non-empty");
    let frontier = Frontier::new(Arc::clone(&queue));
    for seed in &seeds {
        frontier.push(seed_tier, seed).await?;
    }

    let ctx = Arc::new(PipelineContext::new(
        config,
        storage,
        queue,
        transport,
        AnalyzerRegistry::new(),
        flagged_words,
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut pipeline = tokio::spawn(run_pipeline(Arc::clone(&ctx), shutdown_rx));

    tokio::select! {
        result = &mut pipeline => {
            // The pipeline only returns on its own for a fatal error.
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received termination signal, draining pipeline");
            let _ = shutdown_tx.send(true);
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut pipeline).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!("Grace period expired, abandoning in-flight work");
                    pipeline.abort();
                }
            }
        }
    }

    let (discovered, fetched, errors) = ctx.counters.snapshot();
    tracing::info!(
        "Shutting down: {} links discovered, {} resources fetched, {} errors recorded",
        discovered,
        fetched,
        errors
    );

    // SqliteStorage closes its handle on drop; nothing else to flush.
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawler=info,warn"),
            1 => EnvFilter::new("trawler=debug,info"),
            2 => EnvFilter::new("trawler=trace,debug"),
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
