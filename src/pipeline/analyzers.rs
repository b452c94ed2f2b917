//! Content-type-specific analyzer interface
//!
//! Analyzers are external collaborators (perceptual hashing, EXIF
//! extraction, face detection). The pipeline only knows the dispatch
//! contract: for a recognized content type, hand over the bytes and
//! persist whatever structured result comes back. Analyzer failures are
//! recoverable; they are logged through the error sink and the resource is
//! otherwise processed normally.

use crate::telemetry::ErrorKind;
use thiserror::Error;

/// A structured analyzer result, persisted against the content row
#[derive(Debug, Clone)]
pub enum Analysis {
    /// Perceptual image hashes
    PerceptualHash {
        average: u64,
        difference: u64,
        perception: u64,
    },
    /// EXIF metadata; a non-zero latitude marks the hosting domain as
    /// having yielded geolocated content
    Exif {
        camera: String,
        timestamp: i64,
        latitude: f64,
        longitude: f64,
    },
    /// Detected faces
    Faces(Vec<DetectedFace>),
}

/// One detected face
#[derive(Debug, Clone)]
pub struct DetectedFace {
    pub descriptor: Vec<u8>,
    pub bounds: String,
}

/// Analyzer failure, reported through the error sink
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AnalyzerError(pub String);

/// Contract for one content analyzer
pub trait Analyzer: Send + Sync {
    /// Whether this analyzer handles the given content type
    fn supports(&self, content_type: &str) -> bool;

    /// The error kind recorded when this analyzer fails
    fn failure_kind(&self) -> ErrorKind;

    /// Analyzes the bytes; `Ok(None)` means "nothing of interest"
    fn analyze(&self, content_type: &str, bytes: &[u8])
        -> Result<Option<Analysis>, AnalyzerError>;
}

/// The set of analyzers consulted for each recognized content type
pub type AnalyzerRegistry = Vec<Box<dyn Analyzer>>;
