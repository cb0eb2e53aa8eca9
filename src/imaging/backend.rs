//! Thumbnail backend trait and the shared error type.
//!
//! The [`ThumbnailBackend`] trait defines the two pixel-touching operations:
//! pulling an embedded preview out of a JPEG, and decoding + resizing +
//! re-encoding a full image. Everything above it (cache lookups, single-flight,
//! fallback order, concurrency) is backend-agnostic, so tests swap in
//! [`tests::MockBackend`] and count the work it is asked to do.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ResizeParams;
use crate::cancel::CancelToken;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a record has no thumbnail.
///
/// Cloneable so one outcome can be both streamed as an event and kept in the
/// final report; I/O errors are shared behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum ThumbnailError {
    #[error("no EXIF metadata in {0}")]
    NoMetadata(PathBuf),
    #[error("no embedded preview in {0}")]
    NoEmbeddedPreview(PathBuf),
    #[error("cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("not a displayable raster image: {0}")]
    UnsupportedSource(PathBuf),
    #[error("JPEG encode failed: {0}")]
    Encode(String),
    #[error("cannot write cache entry {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("IO error: {0}")]
    Io(Arc<io::Error>),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("worker stopped without reporting a result")]
    WorkerLost,
}

impl From<io::Error> for ThumbnailError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl ThumbnailError {
    /// Expected misses of the embedded-preview fast path. They only trigger
    /// the resize fallback and are never shown to the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoMetadata(_) | Self::NoEmbeddedPreview(_))
    }
}

/// Trait for thumbnail backends.
///
/// Implementations are shared across worker threads and must be `Send + Sync`.
/// Both operations return encoded JPEG bytes; persisting them is the cache's
/// job.
pub trait ThumbnailBackend: Send + Sync {
    /// Bytes of the low-resolution JPEG embedded in a JPEG's EXIF block.
    fn extract_preview(&self, source: &Path) -> Result<Vec<u8>, ThumbnailError>;

    /// Decode the full image, fit it in `max_size`, resample and encode.
    fn resize(&self, params: &ResizeParams, cancel: &CancelToken)
    -> Result<Vec<u8>, ThumbnailError>;
}
