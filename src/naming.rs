//! Filename parsing shared by the scanner and the catalog sort.
//!
//! A photo folder entry is identified by its **basename** (file name minus
//! the final extension) and its **extension**, lowercased so that `.JPG` and
//! `.jpg` compare equal. Cameras name files `<PREFIX><counter>` (e.g.
//! `IMG_0042.JPG`, `P1010007.ORF`); the counter is the numeric suffix used by
//! the numeric catalog sort.

use std::path::Path;

/// Result of splitting a file name like `IMG_0042.JPG`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    /// File name minus the final extension, case preserved (`IMG_0042`).
    pub basename: String,
    /// Lowercased extension without the dot (`jpg`). Empty if none.
    pub extension: String,
}

/// Split a file name into basename and normalized extension.
///
/// - `"IMG_0042.JPG"` → basename=`IMG_0042`, extension=`jpg`
/// - `"archive.tar.gz"` → basename=`archive.tar`, extension=`gz`
/// - `"README"` → basename=`README`, extension=``
/// - `".hidden"` → basename=`.hidden`, extension=``
pub fn parse_file_name(name: &str) -> ParsedFileName {
    let path = Path::new(name);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let basename = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string();
    ParsedFileName {
        basename,
        extension,
    }
}

/// Lowercased extension of a path, without the dot.
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Extract the numeric counter from a camera file name.
///
/// The stem must start with `prefix` and the remainder must be a plain
/// unsigned integer. Anything else yields `None`.
///
/// - `("IMG_0042.jpg", "IMG_")` → `Some(42)`
/// - `("IMG_0042.jpg", "")` → `None` (remainder `IMG_0042` is not a number)
/// - `("0042.jpg", "")` → `Some(42)`
/// - `("DSC_0042.jpg", "IMG_")` → `None`
/// - `("IMG_12a.jpg", "IMG_")` → `None`
pub fn numeric_suffix(file_name: &str, prefix: &str) -> Option<u64> {
    let parsed = parse_file_name(file_name);
    let rest = parsed.basename.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u64>().ok()
}
