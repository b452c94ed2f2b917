//! Trawler: a priority-tiered crawl frontier and pipeline engine
//!
//! This crate implements the core of a distributed web crawler: a durable
//! priority-queue frontier, a probabilistic seen-set for deduplication, a
//! keyword-based link scorer, and the concurrent pipeline that moves a
//! discovered link through scoring, persistence, queueing, fetching, and
//! link extraction back into the frontier.

pub mod config;
pub mod frontier;
pub mod identity;
pub mod pipeline;
pub mod queue;
pub mod scoring;
pub mod storage;
pub mod telemetry;

use thiserror::Error;

/// Main error type for trawler operations
#[derive(Debug, Error)]
pub enum TrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Queue store error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Could not obtain a site identity for {url} after {attempts} attempts")]
    IdentityExhausted { url: String, attempts: usize },

    #[error("Pipeline worker panicked: {0}")]
    WorkerPanic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid flagged-word entry at line {line}: {message}")]
    FlaggedWord { line: usize, message: String },
}

/// Result type alias for trawler operations
pub type Result<T> = std::result::Result<T, TrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use frontier::{Frontier, SeenSet};
pub use pipeline::PipelineContext;
