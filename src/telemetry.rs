//! Error sink and progress counters
//!
//! Failures in the worker loops are recovered locally: the offending URL is
//! abandoned and a structured record is appended to the errors table. There
//! is no caller awaiting an individual crawl, so the error table and the
//! periodic counter log line are the only user-visible failure surface.

use crate::storage::{SqliteStorage, Storage, StorageResult};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Enumerated failure kinds recorded by the error sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UrlParse,
    Fetch,
    ResponseTooLarge,
    BodyRead,
    EmptyBody,
    LengthMismatch,
    MarkupParse,
    PerceptualHash,
    ExifRead,
    FaceDetection,
}

impl ErrorKind {
    /// Stable string form stored in the errors table
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UrlParse => "url-parse",
            ErrorKind::Fetch => "fetch",
            ErrorKind::ResponseTooLarge => "response-too-large",
            ErrorKind::BodyRead => "body-read",
            ErrorKind::EmptyBody => "empty-body",
            ErrorKind::LengthMismatch => "length-mismatch",
            ErrorKind::MarkupParse => "markup-parse",
            ErrorKind::PerceptualHash => "perceptual-hash",
            ErrorKind::ExifRead => "exif-read",
            ErrorKind::FaceDetection => "face-detection",
        }
    }
}

/// Advisory process-wide counters
///
/// Updated with relaxed atomics; the values feed the periodic progress log
/// line and need not be exact.
#[derive(Default)]
pub struct Counters {
    /// Links admitted into the frontier
    pub discovered: AtomicU64,
    /// Resources fetched and processed
    pub fetched: AtomicU64,
    /// Failure records written
    pub errors: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.discovered.load(Ordering::Relaxed),
            self.fetched.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}

/// Writes structured failure records and keeps the error counter
#[derive(Clone)]
pub struct ErrorSink {
    storage: Arc<Mutex<SqliteStorage>>,
    counters: Arc<Counters>,
}

impl ErrorSink {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, counters: Arc<Counters>) -> Self {
        Self { storage, counters }
    }

    /// Records one failure
    ///
    /// The failure itself is recovered, meaning the caller abandons the URL
    /// and moves on, but a failure to *persist* the record indicates a broken
    /// store and is returned to the caller as fatal.
    pub fn record(&self, kind: ErrorKind, url: &str, detail: &str) -> StorageResult<()> {
        tracing::debug!(kind = kind.as_str(), url, detail, "recoverable failure");
        let now = Utc::now().to_rfc3339();
        {
            let mut storage = self.storage.lock().unwrap();
            storage.insert_error(&now, url, kind.as_str(), detail)?;
        }
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
