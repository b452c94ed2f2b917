use serde::Deserialize;

/// Main configuration structure for trawler
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub seen: SeenConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Worker pool sizing and pacing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of parallel worker sets; each set spawns one fetch worker per
    /// tier list entry
    #[serde(rename = "worker-sets", default = "default_worker_sets")]
    pub worker_sets: u32,

    /// Frontier tiers served by each worker set, biased toward the
    /// high-value tiers by listing them once and the baseline several times
    #[serde(rename = "fetch-tiers", default = "default_fetch_tiers")]
    pub fetch_tiers: Vec<u32>,

    /// Link ingest workers
    #[serde(rename = "ingest-workers", default = "default_ingest_workers")]
    pub ingest_workers: u32,

    /// Queue admission workers
    #[serde(rename = "admission-workers", default = "default_admission_workers")]
    pub admission_workers: u32,

    /// Sleep between polls of an empty frontier tier (milliseconds)
    #[serde(rename = "empty-backoff-ms", default = "default_empty_backoff_ms")]
    pub empty_backoff_ms: u64,

    /// Interval between progress log lines (seconds)
    #[serde(
        rename = "progress-interval-secs",
        default = "default_progress_interval"
    )]
    pub progress_interval_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            worker_sets: default_worker_sets(),
            fetch_tiers: default_fetch_tiers(),
            ingest_workers: default_ingest_workers(),
            admission_workers: default_admission_workers(),
            empty_backoff_ms: default_empty_backoff_ms(),
            progress_interval_secs: default_progress_interval(),
        }
    }
}

/// Fetch transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Render pages in a scripted browser instead of plain HTTP GET
    #[serde(rename = "use-browser", default)]
    pub use_browser: bool,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Responses advertising (or reaching) this many bytes are rejected
    #[serde(rename = "max-response-size", default = "default_max_response_size")]
    pub max_response_size: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_browser: false,
            request_timeout_ms: default_request_timeout_ms(),
            max_response_size: default_max_response_size(),
        }
    }
}

/// Seen-set sizing
#[derive(Debug, Clone, Deserialize)]
pub struct SeenConfig {
    /// Expected number of distinct URLs the filter must hold
    #[serde(rename = "expected-items", default = "default_expected_items")]
    pub expected_items: usize,

    /// Acceptable false-positive probability
    #[serde(rename = "false-positive-rate", default = "default_fp_rate")]
    pub false_positive_rate: f64,
}

impl Default for SeenConfig {
    fn default() -> Self {
        Self {
            expected_items: default_expected_items(),
            false_positive_rate: default_fp_rate(),
        }
    }
}

/// Link scoring constants and tier numbers
///
/// Deployments disagree about the exact values, so all of them are
/// configuration; the defaults follow the historically observed behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Scale factor applied to every (visibility × flagged priority) match
    #[serde(rename = "rating-factor", default = "default_rating_factor")]
    pub rating_factor: f64,

    /// Ratings above this threshold promote the link's priority
    #[serde(rename = "promote-threshold", default = "default_promote_threshold")]
    pub promote_threshold: f64,

    /// Tier a promoted link is raised to (never lowered to)
    #[serde(rename = "promote-floor", default = "default_promote_floor")]
    pub promote_floor: u32,

    #[serde(rename = "executable-tier", default = "default_executable_tier")]
    pub executable_tier: u32,

    #[serde(rename = "media-tier", default = "default_media_tier")]
    pub media_tier: u32,

    #[serde(rename = "good-domain-tier", default = "default_good_domain_tier")]
    pub good_domain_tier: u32,

    #[serde(rename = "new-domain-tier", default = "default_new_domain_tier")]
    pub new_domain_tier: u32,

    #[serde(rename = "baseline-tier", default = "default_baseline_tier")]
    pub baseline_tier: u32,

    /// Path suffixes of high-value executable/document types
    #[serde(
        rename = "executable-suffixes",
        default = "default_executable_suffixes"
    )]
    pub executable_suffixes: Vec<String>,

    /// Path suffixes of image/media types of secondary interest
    #[serde(rename = "media-suffixes", default = "default_media_suffixes")]
    pub media_suffixes: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rating_factor: default_rating_factor(),
            promote_threshold: default_promote_threshold(),
            promote_floor: default_promote_floor(),
            executable_tier: default_executable_tier(),
            media_tier: default_media_tier(),
            good_domain_tier: default_good_domain_tier(),
            new_domain_tier: default_new_domain_tier(),
            baseline_tier: default_baseline_tier(),
            executable_suffixes: default_executable_suffixes(),
            media_suffixes: default_media_suffixes(),
        }
    }
}

/// Queue store backend selection
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_backend")]
    pub backend: QueueBackend,

    #[serde(rename = "redis-url", default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_queue_backend(),
            redis_url: default_redis_url(),
        }
    }
}

/// Which queue store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// Shared Redis server (multi-process deployments)
    Redis,
    /// In-process store (tests, single-process runs)
    Memory,
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Input file locations
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Flagged-word list: one `word,priority` pair per line
    #[serde(rename = "flagged-words-path", default = "default_flagged_words_path")]
    pub flagged_words_path: String,

    /// Seed URL list: one URL per line
    #[serde(rename = "seeds-path", default = "default_seeds_path")]
    pub seeds_path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            flagged_words_path: default_flagged_words_path(),
            seeds_path: default_seeds_path(),
        }
    }
}

fn default_worker_sets() -> u32 {
    3
}

fn default_fetch_tiers() -> Vec<u32> {
    vec![90, 80, 70, 60, 50, 50, 50, 50]
}

fn default_ingest_workers() -> u32 {
    5
}

fn default_admission_workers() -> u32 {
    2
}

fn default_empty_backoff_ms() -> u64 {
    2000
}

fn default_progress_interval() -> u64 {
    5
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_response_size() -> u64 {
    200_000_000
}

fn default_expected_items() -> usize {
    10_000_000
}

fn default_fp_rate() -> f64 {
    0.01
}

fn default_rating_factor() -> f64 {
    2.0
}

fn default_promote_threshold() -> f64 {
    20.0
}

fn default_promote_floor() -> u32 {
    80
}

fn default_executable_tier() -> u32 {
    100
}

fn default_media_tier() -> u32 {
    90
}

fn default_good_domain_tier() -> u32 {
    70
}

fn default_new_domain_tier() -> u32 {
    60
}

fn default_baseline_tier() -> u32 {
    50
}

fn default_executable_suffixes() -> Vec<String> {
    [".exe", ".msi", ".apk", ".jar"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_media_suffixes() -> Vec<String> {
    [".png", ".jpg", ".jpeg", ".gif", ".pdf", ".zip", ".mp4"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_queue_backend() -> QueueBackend {
    QueueBackend::Redis
}

fn default_redis_url() -> String {
    "redis://127.0.0.1/".to_string()
}

fn default_database_path() -> String {
    "./trawler.db".to_string()
}

fn default_flagged_words_path() -> String {
    "./config/flagged-words.csv".to_string()
}

fn default_seeds_path() -> String {
    "./config/seeds.txt".to_string()
}
