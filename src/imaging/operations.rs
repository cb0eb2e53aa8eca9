//! High-level thumbnail operations.
//!
//! [`resolve_thumbnail`] is the per-record unit of work: it combines the
//! cache, the single-flight locks and a backend into the
//! cache → embedded preview → resize chain.

use super::backend::{ThumbnailBackend, ThumbnailError};
use super::params::{ResizeParams, ThumbnailSettings};
use crate::cache::{InflightLocks, ThumbnailCache};
use crate::cancel::CancelToken;
use crate::naming::normalized_extension;
use crate::scan::is_raw_extension;
use crate::types::is_jpeg_extension;
use log::debug;
use std::path::{Path, PathBuf};

/// Result type for thumbnail operations.
pub type Result<T> = std::result::Result<T, ThumbnailError>;

/// How a thumbnail came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOrigin {
    /// Already in the cache.
    Cache,
    /// Copied out of the source's EXIF block.
    Embedded,
    /// Decoded and resampled from the full image.
    Resized,
}

/// A thumbnail present in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub path: PathBuf,
    pub origin: ThumbnailOrigin,
}

/// Make sure `source` has a cached thumbnail and return its path.
///
/// 1. cache hit → done;
/// 2. hold the single-flight lock for the entry and re-check;
/// 3. JPEG sources try the embedded EXIF preview;
/// 4. anything else (or a failed extraction) is decoded and resized.
///
/// Raw sources are rejected with [`ThumbnailError::UnsupportedSource`], and a
/// cancelled token short-circuits with [`ThumbnailError::Cancelled`] before
/// any file is touched.
pub fn resolve_thumbnail(
    backend: &dyn ThumbnailBackend,
    cache: &ThumbnailCache,
    locks: &InflightLocks,
    source: &Path,
    settings: &ThumbnailSettings,
    cancel: &CancelToken,
) -> Result<Thumbnail> {
    if cancel.is_cancelled() {
        return Err(ThumbnailError::Cancelled);
    }
    let ext = normalized_extension(source);
    if is_raw_extension(&ext) {
        return Err(ThumbnailError::UnsupportedSource(source.to_path_buf()));
    }

    let entry = cache.locate(source);
    if cache.has_entry(&entry) {
        debug!("{}: cache hit", source.display());
        return Ok(cached(entry));
    }

    locks.run(&entry, || {
        if cache.has_entry(&entry) {
            debug!("{}: produced by a concurrent request", source.display());
            return Ok(cached(entry.clone()));
        }
        if cancel.is_cancelled() {
            return Err(ThumbnailError::Cancelled);
        }

        if is_jpeg_extension(&ext) {
            match extract_into(backend, cache, source, &entry) {
                Ok(()) => {
                    return Ok(Thumbnail {
                        path: entry.clone(),
                        origin: ThumbnailOrigin::Embedded,
                    });
                }
                Err(e) => debug!("{}: {e}, falling back to resize", source.display()),
            }
        }

        let bytes = backend.resize(
            &ResizeParams {
                source: source.to_path_buf(),
                max_size: settings.max_size,
                quality: settings.quality,
            },
            cancel,
        )?;
        cache.store(&entry, &bytes)?;
        Ok(Thumbnail {
            path: entry.clone(),
            origin: ThumbnailOrigin::Resized,
        })
    })
}

fn cached(path: PathBuf) -> Thumbnail {
    Thumbnail {
        path,
        origin: ThumbnailOrigin::Cache,
    }
}

fn extract_into(
    backend: &dyn ThumbnailBackend,
    cache: &ThumbnailCache,
    source: &Path,
    entry: &Path,
) -> Result<()> {
    let preview = backend.extract_preview(source)?;
    cache.store(entry, &preview)
}
