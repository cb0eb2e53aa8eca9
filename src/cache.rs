//! Thumbnail cache shared by every folder view.
//!
//! Decoding a full-resolution photo is the bottleneck of browsing a folder.
//! This module lets repeated views skip it: the first time a source is seen,
//! its thumbnail is written to a fixed location derived from the source path,
//! and every later view just checks that the file exists.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **path-addressed**: the entry for a source lives at
//! `<cache dir>/<sha256(source path bytes)>.jpg`. No manifest is kept. The
//! presence of the file *is* the hit, so the cache survives restarts and is
//! shared between concurrent processes for free.
//!
//! Entries are never invalidated. A photo edited in place keeps serving its
//! old thumbnail until the cache directory is cleared.
//!
//! ## Atomic writes
//!
//! Entries are written to a temporary file in the cache directory and renamed
//! into place, so a reader sees either no entry or a complete one.
//!
//! ## Single-flight
//!
//! [`InflightLocks`] serializes work per entry. Two units asking for the same
//! uncached source in parallel do the decode once: the second waits on the
//! key lock, re-checks the cache and takes the hit.

use crate::config::CacheConfig;
use crate::imaging::{Thumbnail, ThumbnailError, ThumbnailOrigin};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

/// Extension of every cache entry. Entries are always JPEG.
const ENTRY_EXTENSION: &str = "jpg";

/// Directory of path-addressed thumbnail files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    /// A cache rooted at `dir`. The directory is created on the first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.resolved_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the thumbnail for `source` lives, whether or not it exists yet.
    pub fn locate(&self, source: &Path) -> PathBuf {
        self.dir.join(format!("{}.{}", hash_path(source), ENTRY_EXTENSION))
    }

    pub fn has_entry(&self, entry: &Path) -> bool {
        entry.is_file()
    }

    /// Atomically write `bytes` as the cache entry at `entry`.
    pub fn store(&self, entry: &Path, bytes: &[u8]) -> Result<(), ThumbnailError> {
        let dir = entry.parent().unwrap_or(&self.dir);
        std::fs::create_dir_all(dir).map_err(|e| cache_write(entry, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| cache_write(entry, e))?;
        tmp.write_all(bytes).map_err(|e| cache_write(entry, e))?;
        tmp.persist(entry).map_err(|e| cache_write(entry, e.error))?;
        Ok(())
    }
}

fn cache_write(entry: &Path, source: io::Error) -> ThumbnailError {
    ThumbnailError::CacheWrite {
        path: entry.to_path_buf(),
        source: Arc::new(source),
    }
}

/// SHA-256 of a path's raw bytes, returned as a lowercase hex string.
pub fn hash_path(source: &Path) -> String {
    let digest = Sha256::digest(source.as_os_str().as_encoded_bytes());
    format!("{:x}", digest)
}

// =============================================================================
// Single-flight
// =============================================================================

/// Per-entry locks. At most one closure runs per key at a time.
#[derive(Debug, Default)]
pub struct InflightLocks {
    slots: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InflightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` while holding the lock for `key`.
    ///
    /// Callers racing on the same key run one after another, so `work`
    /// should re-check whatever the previous holder may have produced.
    pub fn run<T>(&self, key: &Path, work: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.to_path_buf()).or_default())
        };

        let result = {
            let _held = lock(&slot);
            work()
        };

        let mut slots = lock(&self.slots);
        // One reference in the map, one here: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        drop(slot);
        result
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Summary of cache performance for a pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub extracted: u32,
    pub resized: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn record(&mut self, result: &Result<Thumbnail, ThumbnailError>) {
        match result {
            Ok(thumb) => match thumb.origin {
                ThumbnailOrigin::Cache => self.hits += 1,
                ThumbnailOrigin::Embedded => self.extracted += 1,
                ThumbnailOrigin::Resized => self.resized += 1,
            },
            Err(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.extracted + self.resized + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} extracted, {} resized",
            self.hits, self.extracted, self.resized
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " ({} total)", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    // =========================================================================
    // locate / has_entry
    // =========================================================================

    #[test]
    fn locate_is_deterministic() {
        let cache = ThumbnailCache::new("/tmp/sift-thumbs");
        let a = cache.locate(Path::new("/photos/IMG_1.jpg"));
        let b = cache.locate(Path::new("/photos/IMG_1.jpg"));
        assert_eq!(a, b);
    }

    #[test]
    fn locate_is_hex_sha256_with_jpg_extension() {
        let cache = ThumbnailCache::new("/cache");
        let entry = cache.locate(Path::new("/photos/IMG_1.jpg"));

        assert_eq!(entry.parent(), Some(Path::new("/cache")));
        assert_eq!(entry.extension().unwrap(), "jpg");
        let stem = entry.file_stem().unwrap().to_str().unwrap();
        assert_eq!(stem.len(), 64);
        assert!(
            stem.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn hash_path_known_value() {
        // sha256("abc")
        assert_eq!(
            hash_path(Path::new("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn different_sources_get_different_entries() {
        let cache = ThumbnailCache::new("/cache");
        assert_ne!(
            cache.locate(Path::new("/a/IMG_1.jpg")),
            cache.locate(Path::new("/b/IMG_1.jpg"))
        );
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(tmp.path());
        assert!(!cache.has_entry(&cache.locate(Path::new("/photos/a.jpg"))));
    }

    // =========================================================================
    // store
    // =========================================================================

    #[test]
    fn store_creates_directory_and_entry() {
        let tmp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(tmp.path().join("nested/sift-thumbs"));
        let entry = cache.locate(Path::new("/photos/a.jpg"));

        cache.store(&entry, b"jpeg bytes").unwrap();

        assert!(cache.has_entry(&entry));
        assert_eq!(std::fs::read(&entry).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn store_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(tmp.path());
        let entry = cache.locate(Path::new("/photos/a.jpg"));

        cache.store(&entry, b"first").unwrap();
        cache.store(&entry, b"second").unwrap();

        let files: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read(&entry).unwrap(), b"second");
    }

    #[test]
    fn store_into_unwritable_location_is_cache_write_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let cache = ThumbnailCache::new(&blocker);

        let err = cache
            .store(&cache.locate(Path::new("/photos/a.jpg")), b"x")
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::CacheWrite { .. }));
    }

    #[test]
    fn from_config_uses_directory_override() {
        let config = CacheConfig {
            directory: Some("/custom/thumbs".into()),
            ..CacheConfig::default()
        };
        assert_eq!(
            ThumbnailCache::from_config(&config).dir(),
            Path::new("/custom/thumbs")
        );
    }

    // =========================================================================
    // InflightLocks
    // =========================================================================

    #[test]
    fn run_returns_work_result_and_releases_slot() {
        let locks = InflightLocks::new();
        let value = locks.run(Path::new("/k"), || 42);
        assert_eq!(value, 42);
        assert!(locks.is_empty());
    }

    #[test]
    fn same_key_never_runs_concurrently() {
        let locks = InflightLocks::new();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    locks.run(Path::new("/same"), || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(5));
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn different_keys_run_in_parallel() {
        let locks = InflightLocks::new();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for i in 0..4 {
                let (locks, active, peak) = (&locks, &active, &peak);
                s.spawn(move || {
                    let key = PathBuf::from(format!("/key-{i}"));
                    locks.run(&key, || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(50));
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) > 1);
        assert!(locks.is_empty());
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    fn thumb(origin: ThumbnailOrigin) -> Result<Thumbnail, ThumbnailError> {
        Ok(Thumbnail {
            path: "/cache/x.jpg".into(),
            origin,
        })
    }

    #[test]
    fn cache_stats_record_counts_by_origin() {
        let mut s = CacheStats::default();
        s.record(&thumb(ThumbnailOrigin::Cache));
        s.record(&thumb(ThumbnailOrigin::Cache));
        s.record(&thumb(ThumbnailOrigin::Embedded));
        s.record(&thumb(ThumbnailOrigin::Resized));
        s.record(&Err(ThumbnailError::Cancelled));

        assert_eq!(
            s,
            CacheStats {
                hits: 2,
                extracted: 1,
                resized: 1,
                failed: 1
            }
        );
        assert_eq!(s.total(), 5);
    }

    #[test]
    fn cache_stats_display_without_failures() {
        let s = CacheStats {
            hits: 5,
            extracted: 1,
            resized: 2,
            failed: 0,
        };
        assert_eq!(format!("{}", s), "5 cached, 1 extracted, 2 resized (8 total)");
    }

    #[test]
    fn cache_stats_display_with_failures() {
        let s = CacheStats {
            hits: 0,
            extracted: 0,
            resized: 3,
            failed: 1,
        };
        assert_eq!(
            format!("{}", s),
            "0 cached, 0 extracted, 3 resized, 1 failed (4 total)"
        );
    }
}
