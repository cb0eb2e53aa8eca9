//! Configuration module.
//!
//! Handles loading, validating, and merging `sift.toml`. Stock defaults are
//! the base layer; an optional `sift.toml` in the browsed folder overrides
//! them, and CLI flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnails]
//! max_size = 300            # Longer edge of resized thumbnails, in px
//! quality = 85              # JPEG quality (1-100)
//!
//! [cache]
//! dir_name = "sift-thumbs"  # Directory under the platform temp root
//! # directory = "/path"     # Absolute override for the cache directory
//!
//! [pipeline]
//! unit_timeout_secs = 30    # Per-record timeout (0 = no timeout)
//! # max_threads = 4         # Cap on worker threads (omit: one per record)
//!
//! [catalog]
//! sort = "scan"             # "scan", "numeric-desc" or "numeric-asc"
//! numeric_prefix = "IMG_"   # Stripped before parsing the numeric suffix
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in a browsed folder.
pub const CONFIG_FILENAME: &str = "sift.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiftConfig {
    /// Thumbnail generation settings.
    pub thumbnails: ThumbnailsConfig,
    /// Cache location.
    pub cache: CacheConfig,
    /// Worker pool and per-record limits.
    pub pipeline: PipelineConfig,
    /// Catalog ordering.
    pub catalog: CatalogConfig,
}

impl SiftConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.max_size == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_size must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        let name = &self.cache.dir_name;
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(ConfigError::Validation(
                "cache.dir_name must be a single, non-empty path component".into(),
            ));
        }
        if self.pipeline.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "pipeline.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Longer edge of a resized thumbnail. Some deployments use 150.
    pub max_size: u32,
    /// JPEG encoding quality.
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            max_size: 300,
            quality: 85,
        }
    }
}

/// Cache location settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Subdirectory of the platform temp root.
    pub dir_name: String,
    /// Full override of the cache directory. Wins over `dir_name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir_name: "sift-thumbs".to_string(),
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Resolve the directory thumbnails are written to.
    pub fn resolved_dir(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(&self.dir_name))
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Seconds a single record may take before it is reported as timed out.
    /// `0` disables the timeout.
    pub unit_timeout_secs: u64,
    /// Cap on worker threads. When absent, each run gets one thread per
    /// record. Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unit_timeout_secs: 30,
            max_threads: None,
        }
    }
}

impl PipelineConfig {
    pub fn unit_timeout(&self) -> Option<Duration> {
        (self.unit_timeout_secs > 0).then(|| Duration::from_secs(self.unit_timeout_secs))
    }
}

/// Resolve the worker cap from config.
///
/// - `None` → no cap: every record gets its own worker
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &PipelineConfig) -> Option<usize> {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores))
}

/// How a scanned catalog is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Scanner order, no reordering.
    #[default]
    Scan,
    /// Numeric filename suffix, highest first.
    NumericDesc,
    /// Numeric filename suffix, lowest first.
    NumericAsc,
}

/// Catalog ordering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub sort: SortOrder,
    /// Prefix stripped from the file stem before parsing the counter.
    pub numeric_prefix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sort: SortOrder::Scan,
            numeric_prefix: "IMG_".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiftConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `sift.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `sift.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiftConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiftConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a browsed folder: stock defaults plus its `sift.toml`.
pub fn load_config(dir: &Path) -> Result<SiftConfig, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Returns a fully-commented stock `sift.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Sift configuration
# ==================
# Place this file as `sift.toml` inside a photo folder to override the
# defaults for that folder. Every key is optional.

[thumbnails]
# Longer edge of resized thumbnails, in pixels. Embedded EXIF previews are
# served as-is and keep their own size.
max_size = 300
# JPEG quality used when re-encoding resized thumbnails (1-100).
quality = 85

[cache]
# Thumbnails live in <temp dir>/<dir_name>/<sha256(path)>.jpg
dir_name = "sift-thumbs"
# Uncomment to put the cache somewhere else entirely.
# directory = "/var/cache/sift"

[pipeline]
# A record that takes longer than this is reported as timed out and keeps
# its placeholder. 0 disables the timeout.
unit_timeout_secs = 30
# Cap on worker threads. Omit to give every image its own worker.
# max_threads = 4

[catalog]
# "scan"          keep scanner order
# "numeric-desc"  sort by the number after `numeric_prefix`, highest first
# "numeric-asc"   same, lowest first
sort = "scan"
numeric_prefix = "IMG_"
"##
}
