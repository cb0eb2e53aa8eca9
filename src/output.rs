//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! /photos/2024-06 (3 images)
//! 001 IMG_10.jpg
//!     Raw: IMG_10.orf
//! 002 IMG_2.jpg
//! 003 scan.png
//! ```
//!
//! ## Thumbs
//!
//! One line per record as it completes (any order), then the summary:
//!
//! ```text
//! 002 IMG_2.jpg: embedded → /tmp/sift-thumbs/3f1a….jpg
//! 001 IMG_10.jpg: resized → /tmp/sift-thumbs/9bc2….jpg
//! 003 scan.png: failed (cannot decode /photos/2024-06/scan.png: …)
//! Thumbnails: 0 cached, 1 extracted, 1 resized, 1 failed (3 total)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `String`s) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::cache::CacheStats;
use crate::imaging::ThumbnailOrigin;
use crate::pipeline::ThumbnailOutcome;
use crate::types::Catalog;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn origin_label(origin: ThumbnailOrigin) -> &'static str {
    match origin {
        ThumbnailOrigin::Cache => "cached",
        ThumbnailOrigin::Embedded => "embedded",
        ThumbnailOrigin::Resized => "resized",
    }
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_catalog(catalog: &Catalog, folder: &Path) -> Vec<String> {
    let mut lines = Vec::with_capacity(catalog.len() + 1);
    let noun = if catalog.len() == 1 { "image" } else { "images" };
    lines.push(format!("{} ({} {})", folder.display(), catalog.len(), noun));

    for (i, record) in catalog.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), record.file_name()));
        if let Some(raw) = &record.raw_path {
            lines.push(format!("{}Raw: {}", indent(1), file_name(raw)));
        }
        if record.rating != 0 {
            lines.push(format!("{}Rating: {}", indent(1), record.rating));
        }
    }
    lines
}

pub fn print_catalog(catalog: &Catalog, folder: &Path) {
    for line in format_catalog(catalog, folder) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbs
// ============================================================================

/// One line for a completed record.
pub fn format_outcome(outcome: &ThumbnailOutcome) -> String {
    let head = format!(
        "{} {}",
        format_index(outcome.index + 1),
        file_name(&outcome.source_path)
    );
    match &outcome.result {
        Ok(thumb) => format!(
            "{}: {} → {}",
            head,
            origin_label(thumb.origin),
            thumb.path.display()
        ),
        Err(e) => format!("{}: failed ({})", head, e),
    }
}

pub fn format_summary(stats: &CacheStats) -> String {
    format!("Thumbnails: {}", stats)
}

pub fn print_outcome(outcome: &ThumbnailOutcome) {
    println!("{}", format_outcome(outcome));
}

pub fn print_summary(stats: &CacheStats) {
    println!("{}", format_summary(stats));
}

// ============================================================================
// Locate
// ============================================================================

pub fn format_locate(source: &Path, entry: &Path, hit: bool) -> Vec<String> {
    vec![
        source.display().to_string(),
        format!("{}Cache: {}", indent(1), entry.display()),
        format!("{}Status: {}", indent(1), if hit { "hit" } else { "miss" }),
    ]
}

pub fn print_locate(source: &Path, entry: &Path, hit: bool) {
    for line in format_locate(source, entry, hit) {
        println!("{}", line);
    }
}
