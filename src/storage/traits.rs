//! Storage trait and error types

use crate::storage::{
    ContentRecord, ExifRecord, FaceRecord, LinkEdgeRecord, PerceptualHashRecord, SiteRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Insert returned no identity for {0}")]
    MissingIdentity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the persistent store backend
///
/// The pipeline consumes the store through "insert returning identity" and
/// "select by unique key" operations. Implementations are wrapped in a
/// shared mutex by the pipeline, so methods take `&mut self` and need not
/// be internally synchronized.
pub trait Storage {
    // ===== Identities =====

    /// Inserts a domain if its hostname is unseen and returns its identity
    fn insert_or_get_domain(&mut self, name: &str) -> StorageResult<i64>;

    /// Inserts a new site row, returning the assigned identity
    ///
    /// Fails with [`StorageError::ConstraintViolation`] if the URL already
    /// exists; callers resolve the race by re-selecting.
    fn insert_site(&mut self, url: &str, domain_id: i64) -> StorageResult<i64>;

    /// Looks up a site by its exact URL string
    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Loads every persisted site URL (seen-set priming at startup)
    fn site_urls(&self) -> StorageResult<Vec<String>>;

    /// Interns a content-type name and returns its identity
    fn insert_or_get_content_type(&mut self, name: &str) -> StorageResult<i64>;

    // ===== Crawl output =====

    /// Appends a link edge, returning its row id
    fn insert_link_edge(&mut self, edge: &LinkEdgeRecord) -> StorageResult<i64>;

    /// Appends one keyword evidence row for a link edge
    fn insert_link_keyword(
        &mut self,
        link_edge_id: i64,
        visibility: u32,
        text: &str,
    ) -> StorageResult<()>;

    /// Appends a content record, returning its row id
    fn insert_content(&mut self, record: &ContentRecord) -> StorageResult<i64>;

    /// Appends a structured failure record
    fn insert_error(&mut self, time: &str, url: &str, kind: &str, detail: &str)
        -> StorageResult<()>;

    // ===== Analyzer results =====

    fn insert_perceptual_hash(&mut self, record: &PerceptualHashRecord) -> StorageResult<()>;

    fn insert_exif(&mut self, record: &ExifRecord) -> StorageResult<()>;

    fn insert_face(&mut self, record: &FaceRecord) -> StorageResult<()>;

    /// Stores a file blob keyed by its SHA-1 fingerprint; duplicate
    /// fingerprints are ignored
    fn store_file(&mut self, sha1: &str, bytes: &[u8]) -> StorageResult<()>;

    // ===== Counters (progress logging and tests) =====

    fn count_contents(&self) -> StorageResult<u64>;

    fn count_link_edges(&self) -> StorageResult<u64>;

    fn count_errors_by_kind(&self, kind: &str) -> StorageResult<u64>;
}
