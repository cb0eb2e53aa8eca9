//! Shared types passed between the scanner, the pipeline and the display layer.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// One physical photograph ready for display.
///
/// Built by [`scan_folder`](crate::scan::scan_folder); `source_path` is always
/// a JPEG or PNG. A raw sidecar sharing the basename is kept in `raw_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub source_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<PathBuf>,
    /// Cached thumbnail, filled in by the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_path: Option<PathBuf>,
    /// Lowercase extension of `source_path`, without the dot.
    pub format: String,
    /// User rating. Only the display layer changes it; never persisted.
    pub rating: i32,
}

impl ImageRecord {
    pub fn new(source_path: PathBuf, format: impl Into<String>) -> Self {
        Self {
            source_path,
            raw_path: None,
            thumb_path: None,
            format: format.into(),
            rating: 0,
        }
    }

    /// File name of the displayable source, for display and sorting.
    pub fn file_name(&self) -> &str {
        self.source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn is_jpeg(&self) -> bool {
        is_jpeg_extension(&self.format)
    }

    pub fn has_raw(&self) -> bool {
        self.raw_path.is_some()
    }

    pub fn thumb(&self) -> Option<&Path> {
        self.thumb_path.as_deref()
    }
}

/// Ordered records for one folder.
pub type Catalog = Vec<ImageRecord>;

pub(crate) fn is_jpeg_extension(ext: &str) -> bool {
    matches!(ext, "jpg" | "jpeg")
}
