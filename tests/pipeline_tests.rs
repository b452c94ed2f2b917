//! Integration tests for the crawl pipeline
//!
//! These tests use wiremock to stand up a mock origin server, the
//! in-process queue store in place of Redis, and a temp-file database, then
//! run the real pipeline end to end.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use trawler::config::Config;
use trawler::pipeline::{run_pipeline, AnalyzerRegistry, HttpTransport, Transport};
use trawler::queue::{MemoryQueueStore, QueueStore};
use trawler::scoring::FlaggedWord;
use trawler::storage::{SqliteStorage, Storage};
use trawler::{Frontier, PipelineContext};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a pipeline-friendly test configuration
fn test_config(db_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.crawler.worker_sets = 1;
    config.crawler.fetch_tiers = vec![90, 80, 60, 50];
    config.crawler.ingest_workers = 2;
    config.crawler.admission_workers = 1;
    config.crawler.empty_backoff_ms = 25;
    config.storage.database_path = db_path.to_string_lossy().into_owned();
    config
}

struct TestPipeline {
    ctx: Arc<PipelineContext>,
    queue: Arc<MemoryQueueStore>,
    db_path: PathBuf,
    _dir: tempfile::TempDir,
}

/// Builds a full pipeline context against the mock server
fn build_pipeline(flagged_words: Vec<FlaggedWord>, max_response_size: u64) -> TestPipeline {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    let mut config = test_config(&db_path);
    config.fetch.max_response_size = max_response_size;

    let storage = Arc::new(Mutex::new(SqliteStorage::new(&db_path).unwrap()));
    let queue = Arc::new(MemoryQueueStore::new());
    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(Duration::from_secs(5), max_response_size).unwrap(),
    );

    let ctx = PipelineContext::new(
        config,
        storage,
        Arc::clone(&queue) as Arc<dyn QueueStore>,
        transport,
        AnalyzerRegistry::new(),
        flagged_words,
    )
    .unwrap();

    TestPipeline {
        ctx: Arc::new(ctx),
        queue,
        db_path,
        _dir: dir,
    }
}

/// Seeds one URL, runs the pipeline for a bounded interval, then drains it
async fn crawl_for(pipeline: &TestPipeline, seed: &str, duration: Duration) {
    let frontier = Frontier::new(Arc::clone(&pipeline.queue) as Arc<dyn QueueStore>);
    frontier.push(90, seed).await.unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(run_pipeline(Arc::clone(&pipeline.ctx), shutdown_rx));

    tokio::time::sleep(duration).await;
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("pipeline failed to drain")
        .unwrap()
        .unwrap();
}

fn query_one<T: rusqlite::types::FromSql>(db_path: &std::path::Path, sql: &str) -> T {
    let conn = rusqlite::Connection::open(db_path).unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[tokio::test]
async fn heading_link_is_scored_admitted_and_fetched_exactly_once() {
    let server = MockServer::start().await;

    // The seed page links to /about from inside an <h1>; /about links back
    // to itself, so the second discovery must be dropped by the seen-set.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><h1><a href="/about">About</a></h1></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="/about">About</a></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    // "about" is flagged with priority 2: rating = 7 (h1) * 2.0 * 2 = 28,
    // which exceeds the promotion threshold and lifts the link to tier 80.
    let pipeline = build_pipeline(vec![FlaggedWord::new("about", 2)], 200_000_000);
    let seed = format!("{}/", server.uri());
    crawl_for(&pipeline, &seed, Duration::from_millis(1500)).await;

    // Both pages were fetched and recorded.
    let contents: i64 = query_one(&pipeline.db_path, "SELECT COUNT(*) FROM contents");
    assert_eq!(contents, 2);

    // The about link was admitted exactly once.
    assert_eq!(pipeline.ctx.counters.snapshot().0, 1);

    // Its edge carries the h1-weighted rating.
    let rating: f64 = query_one(
        &pipeline.db_path,
        "SELECT rating FROM link_edges ORDER BY id LIMIT 1",
    );
    assert_eq!(rating, 28.0);

    // The keyword evidence row survived with its heading visibility.
    let visibility: i64 = query_one(
        &pipeline.db_path,
        "SELECT visibility FROM link_keywords ORDER BY id LIMIT 1",
    );
    assert_eq!(visibility, 7);

    // No failures along the way. The mock expectations (each page fetched
    // exactly once) are verified when the server drops.
    let errors: i64 = query_one(&pipeline.db_path, "SELECT COUNT(*) FROM errors");
    assert_eq!(errors, 0);
}

#[tokio::test]
async fn oversized_response_is_rejected_before_body_read() {
    let server = MockServer::start().await;

    // 4 KiB body against a 1 KiB ceiling: the advertised content length
    // alone must reject the response.
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 4096]))
        .mount(&server)
        .await;

    let pipeline = build_pipeline(Vec::new(), 1024);
    let seed = format!("{}/big", server.uri());
    crawl_for(&pipeline, &seed, Duration::from_millis(500)).await;

    let storage = pipeline.ctx.storage.lock().unwrap();
    assert_eq!(storage.count_errors_by_kind("response-too-large").unwrap(), 1);
    assert_eq!(storage.count_contents().unwrap(), 0);
}

#[tokio::test]
async fn identical_bytes_under_two_urls_share_fingerprints() {
    let server = MockServer::start().await;

    let body = r#"<html><body><p>same bytes</p></body></html>"#;
    for p in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    let pipeline = build_pipeline(Vec::new(), 200_000_000);
    let frontier = Frontier::new(Arc::clone(&pipeline.queue) as Arc<dyn QueueStore>);
    frontier
        .push(90, &format!("{}/a", server.uri()))
        .await
        .unwrap();
    frontier
        .push(90, &format!("{}/b", server.uri()))
        .await
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(run_pipeline(Arc::clone(&pipeline.ctx), shutdown_rx));
    tokio::time::sleep(Duration::from_millis(800)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    // Two content rows with identical digests but distinct sites.
    let contents: i64 = query_one(&pipeline.db_path, "SELECT COUNT(*) FROM contents");
    assert_eq!(contents, 2);

    let distinct_sha: i64 = query_one(
        &pipeline.db_path,
        "SELECT COUNT(DISTINCT sha512) FROM contents",
    );
    assert_eq!(distinct_sha, 1);

    let distinct_sites: i64 = query_one(
        &pipeline.db_path,
        "SELECT COUNT(DISTINCT site_id) FROM contents",
    );
    assert_eq!(distinct_sites, 2);
}

#[tokio::test]
async fn seen_set_is_primed_from_persisted_sites() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    // A previous run persisted this site.
    {
        let mut storage = SqliteStorage::new(&db_path).unwrap();
        let domain = storage.insert_or_get_domain("example.com").unwrap();
        storage
            .insert_site("https://example.com/already-done", domain)
            .unwrap();
    }

    let config = test_config(&db_path);
    let storage = Arc::new(Mutex::new(SqliteStorage::new(&db_path).unwrap()));
    let queue: Arc<dyn QueueStore> = Arc::new(MemoryQueueStore::new());
    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(Duration::from_secs(5), 1_000_000).unwrap(),
    );
    let ctx = PipelineContext::new(
        config,
        storage,
        queue,
        transport,
        AnalyzerRegistry::new(),
        Vec::new(),
    )
    .unwrap();

    // A restart must not re-admit the persisted URL.
    assert!(ctx.seen.test_and_mark("https://example.com/already-done"));
    assert!(!ctx.seen.test_and_mark("https://example.com/brand-new"));
}
