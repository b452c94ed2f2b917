//! Storage module for persisted crawl data
//!
//! This module handles all relational persistence for the engine:
//! - Site and domain identity rows
//! - Append-only link edges and their keyword evidence
//! - Content records with cryptographic fingerprints
//! - Structured failure records
//! - Analyzer results and content-addressed file blobs

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// A persisted site: a stable integer identity for a canonical URL
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub domain_id: i64,
}

/// An immutable link edge between two sites
#[derive(Debug, Clone)]
pub struct LinkEdgeRecord {
    /// Discovery time as unix microseconds
    pub time_found: i64,
    pub origin: i64,
    pub destination: i64,
    pub rating: f64,
}

/// A persisted record of one fetched resource
#[derive(Debug, Clone)]
pub struct ContentRecord {
    /// Discovery time as unix microseconds
    pub time_found: i64,
    pub site_id: i64,
    pub content_type_id: i64,
    pub http_status: u16,
    pub size: usize,
    /// Hex-encoded SHA-512 digest of the raw bytes
    pub sha512: String,
    /// Hex-encoded SHA-1 digest of the raw bytes
    pub sha1: String,
}

/// Perceptual hashes computed for an image content row
#[derive(Debug, Clone)]
pub struct PerceptualHashRecord {
    pub content_id: i64,
    pub average_hash: u64,
    pub difference_hash: u64,
    pub perception_hash: u64,
}

/// EXIF metadata extracted from an image content row
#[derive(Debug, Clone)]
pub struct ExifRecord {
    pub content_id: i64,
    pub camera: String,
    /// Capture time as unix microseconds
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// One detected face associated with an image content row
#[derive(Debug, Clone)]
pub struct FaceRecord {
    pub content_id: i64,
    pub descriptor: Vec<u8>,
    pub bounds: String,
}
