//! Pipeline orchestration
//!
//! The crawl is a cyclic pipeline of three worker-pool stages decoupled by
//! bounded in-process channels and the durable frontier:
//!
//! ```text
//! Frontier ──pop──> Fetch-and-Extract ──RawLink──> Link Ingest
//!     ^                                                 │
//!     └───────── Queue Admission <──ScoredLink──────────┘
//! ```
//!
//! Bounded channels give backpressure: a full downstream queue blocks the
//! upstream producer, throttling fetch concurrency to persistence
//! capacity. The frontier pop is the only poll-and-backoff point; every
//! other hand-off is a true blocking channel send/recv.
//!
//! All shared state lives in one [`PipelineContext`] built at startup and
//! handed to every worker: single shared instance, lifetime of the
//! process.

mod admission;
mod analyzers;
mod extract;
mod fetch;
mod ingest;
mod sniff;
mod transport;

pub use admission::admission_worker;
pub use analyzers::{Analysis, Analyzer, AnalyzerError, AnalyzerRegistry, DetectedFace};
pub use extract::{extract_links, RawLink};
pub use fetch::fetch_worker;
pub use ingest::ingest_worker;
pub use sniff::detect_content_type;
pub use transport::{BrowserTransport, FetchError, Fetched, HttpTransport, Transport};

use crate::config::Config;
use crate::frontier::{Frontier, SeenSet};
use crate::identity::{ContentTypeResolver, SiteResolver};
use crate::queue::QueueStore;
use crate::scoring::{DomainReputation, FlaggedWord};
use crate::storage::{SqliteStorage, Storage};
use crate::telemetry::{Counters, ErrorSink};
use crate::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use url::Url;

/// Depth of the bounded channels between stages
const CHANNEL_DEPTH: usize = 1024;

/// A link that has been scored and is awaiting admission
#[derive(Debug, Clone)]
pub struct ScoredLink {
    pub dest: Url,
    pub priority: u32,
}

/// Receiver end shared by a pool of stage workers
type SharedReceiver<T> = Arc<tokio::sync::Mutex<mpsc::Receiver<T>>>;

/// Shared resources for every pipeline worker
pub struct PipelineContext {
    pub config: Config,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub frontier: Frontier,
    pub seen: SeenSet,
    pub sites: SiteResolver,
    pub content_types: ContentTypeResolver,
    pub reputation: DomainReputation,
    pub flagged_words: Vec<FlaggedWord>,
    pub transport: Arc<dyn Transport>,
    pub analyzers: AnalyzerRegistry,
    pub counters: Arc<Counters>,
    pub errors: ErrorSink,
}

impl PipelineContext {
    /// Assembles the shared context and primes the seen-set from every
    /// persisted site URL
    ///
    /// Priming trades a startup scan for not having to persist the filter:
    /// a restarted process will not re-admit URLs it already processed.
    pub fn new(
        config: Config,
        storage: Arc<Mutex<SqliteStorage>>,
        queue: Arc<dyn QueueStore>,
        transport: Arc<dyn Transport>,
        analyzers: AnalyzerRegistry,
        flagged_words: Vec<FlaggedWord>,
    ) -> Result<Self> {
        let seen = SeenSet::with_capacity(
            config.seen.expected_items,
            config.seen.false_positive_rate,
        );

        let known_urls = {
            let guard = storage.lock().unwrap();
            guard.site_urls()?
        };
        tracing::info!("Priming seen-set with {} persisted URLs", known_urls.len());
        for url in &known_urls {
            seen.mark(url);
        }

        let counters = Arc::new(Counters::new());

        Ok(Self {
            frontier: Frontier::new(Arc::clone(&queue)),
            sites: SiteResolver::new(Arc::clone(&storage), queue),
            content_types: ContentTypeResolver::new(Arc::clone(&storage)),
            reputation: DomainReputation::new(),
            errors: ErrorSink::new(Arc::clone(&storage), Arc::clone(&counters)),
            counters,
            seen,
            config,
            storage,
            flagged_words,
            transport,
            analyzers,
        })
    }
}

/// Runs the pipeline until shutdown is signalled or a worker fails fatally
///
/// Spawns the configured worker pools: one fetch worker per (worker set ×
/// tier list entry), plus the ingest and admission pools. Recoverable
/// failures never surface here; an `Err` from a worker means a broken
/// dependency and aborts the whole pipeline.
pub async fn run_pipeline(
    ctx: Arc<PipelineContext>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (links_tx, links_rx) = mpsc::channel::<RawLink>(CHANNEL_DEPTH);
    let (scored_tx, scored_rx) = mpsc::channel::<ScoredLink>(CHANNEL_DEPTH);
    let links_rx: SharedReceiver<RawLink> = Arc::new(tokio::sync::Mutex::new(links_rx));
    let scored_rx: SharedReceiver<ScoredLink> = Arc::new(tokio::sync::Mutex::new(scored_rx));

    let mut workers: JoinSet<Result<()>> = JoinSet::new();

    let crawler = &ctx.config.crawler;
    for _ in 0..crawler.worker_sets {
        for &tier in &crawler.fetch_tiers {
            workers.spawn(fetch_worker(
                Arc::clone(&ctx),
                tier,
                links_tx.clone(),
                shutdown.clone(),
            ));
        }
    }
    for _ in 0..crawler.ingest_workers {
        workers.spawn(ingest_worker(
            Arc::clone(&ctx),
            Arc::clone(&links_rx),
            scored_tx.clone(),
        ));
    }
    for _ in 0..crawler.admission_workers {
        workers.spawn(admission_worker(Arc::clone(&ctx), Arc::clone(&scored_rx)));
    }
    // Workers hold the only remaining senders; dropping ours lets the
    // channels close once the fetch pool drains on shutdown.
    drop(links_tx);
    drop(scored_tx);

    spawn_progress_logger(Arc::clone(&ctx), shutdown.clone());

    tracing::info!(
        "Pipeline started: {} fetch, {} ingest, {} admission workers",
        crawler.worker_sets as usize * crawler.fetch_tiers.len(),
        crawler.ingest_workers,
        crawler.admission_workers
    );

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Pipeline worker failed fatally: {e}");
                workers.abort_all();
                return Err(e);
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!("Pipeline worker panicked: {e}");
                workers.abort_all();
                return Err(crate::TrawlerError::WorkerPanic(e.to_string()));
            }
        }
    }

    tracing::info!("Pipeline drained");
    Ok(())
}

/// Logs the advisory counters at a fixed interval
fn spawn_progress_logger(ctx: Arc<PipelineContext>, shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(ctx.config.crawler.progress_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if *shutdown.borrow() {
                break;
            }
            let (discovered, fetched, errors) = ctx.counters.snapshot();
            tracing::info!(
                "Progress: {} links discovered, {} resources fetched, {} errors",
                discovered,
                fetched,
                errors
            );
        }
    });
}
