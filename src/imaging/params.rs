//! Parameter types for thumbnail operations.
//!
//! These structs describe *what* to produce, not *how*. They are the
//! interface between [`operations`](super::operations), which decides what a
//! record needs, and the [`backend`](super::backend), which does the pixel work.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// What a resized thumbnail should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSettings {
    /// Longer edge of the output, in pixels.
    pub max_size: u32,
    pub quality: Quality,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            max_size: 300,
            quality: Quality::default(),
        }
    }
}

impl ThumbnailSettings {
    pub fn from_config(config: &crate::config::ThumbnailsConfig) -> Self {
        Self {
            max_size: config.max_size,
            quality: Quality::new(config.quality),
        }
    }
}

/// Parameters for one decode → fit → resample → encode run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub max_size: u32,
    pub quality: Quality,
}
