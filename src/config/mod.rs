//! Configuration module
//!
//! Handles loading, parsing, and validating the TOML configuration file,
//! plus the two auxiliary input files: the flagged-word list (CSV-like
//! `word,priority` pairs) and the seed URL list.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetchConfig, InputConfig, QueueBackend, QueueConfig, ScoringConfig,
    SeenConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_flagged_words, load_seed_urls};
