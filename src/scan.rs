//! Folder scanning and raw/display pairing.
//!
//! A photo folder typically holds what the camera wrote: a JPEG and a raw
//! file per shot, sharing the basename.
//!
//! ```text
//! DCIM/100OLYMP/
//! ├── P1010001.JPG     ┐ one record: source=P1010001.JPG, raw=P1010001.ORF
//! ├── P1010001.ORF     ┘
//! ├── P1010002.ORF       raw only: no record
//! ├── P1010003.png       one record: source=P1010003.png
//! ├── notes.txt          unsupported: ignored
//! └── export/            subdirectory: ignored
//! ```
//!
//! ## Rules
//!
//! - Non-recursive; subdirectories are skipped.
//! - Extensions compare case-insensitively (`.JPG` == `.jpg`).
//! - Within a basename group a JPEG wins over a PNG as the displayable
//!   source; a raw file is only ever a sidecar.
//! - A group without a displayable member produces no record.
//! - Entries are visited in file-name order, so when two entries compete for
//!   the same slot (`a.JPG` and `a.jpg`) the result is deterministic.

use crate::config::SortOrder;
use crate::naming::{numeric_suffix, parse_file_name};
use crate::types::{Catalog, ImageRecord, is_jpeg_extension};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions the scanner keeps, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "orf"];

/// Raw sidecar extensions. Never decoded, never thumbnailed.
pub const RAW_EXTENSIONS: &[&str] = &["orf"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read folder {path}: {source}")]
    FolderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext)
}

pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext)
}

/// Members of one basename group, collected before a record is emitted.
#[derive(Debug, Default)]
struct Group {
    jpeg: Option<(PathBuf, String)>,
    png: Option<(PathBuf, String)>,
    raw: Option<PathBuf>,
}

impl Group {
    fn into_record(self) -> Option<ImageRecord> {
        let (source, format) = self.jpeg.or(self.png)?;
        let mut record = ImageRecord::new(source, format);
        record.raw_path = self.raw;
        Some(record)
    }
}

/// Scan a folder into a catalog of displayable records.
///
/// A relative `dir` is resolved against the working directory first, so
/// every record carries an absolute `source_path`.
///
/// Fails only when the folder itself cannot be listed; no partial catalog is
/// returned in that case. Unreadable individual entries are skipped.
pub fn scan_folder(dir: &Path) -> Result<Catalog, ScanError> {
    let read_err = |source| ScanError::FolderRead {
        path: dir.to_path_buf(),
        source,
    };
    let dir = std::path::absolute(dir).map_err(read_err)?;

    let mut entries = file_entries(&dir, fs::read_dir(&dir).map_err(read_err)?);
    entries.sort();

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for (name, path) in entries {
        let parsed = parse_file_name(&name);
        if !is_supported_extension(&parsed.extension) {
            continue;
        }
        let group = groups.entry(parsed.basename).or_default();
        let ext = parsed.extension;
        let slot_taken = if is_jpeg_extension(&ext) {
            fill(&mut group.jpeg, (path, ext))
        } else if is_raw_extension(&ext) {
            fill(&mut group.raw, path)
        } else {
            fill(&mut group.png, (path, ext))
        };
        if slot_taken {
            debug!("{name}: basename already has a {} member, ignored", ext_kind(&name));
        }
    }

    let mut catalog = Catalog::with_capacity(groups.len());
    for (basename, group) in groups {
        match group.into_record() {
            Some(record) => catalog.push(record),
            None => debug!("{basename}: raw file without a displayable sibling, skipped"),
        }
    }

    info!("scanned {}: {} records", dir.display(), catalog.len());
    Ok(catalog)
}

/// Regular files among `listing` as `(name, path)`. Subdirectories, entries
/// that fail to read and non UTF-8 names are skipped.
fn file_entries<I>(dir: &Path, listing: I) -> Vec<(String, PathBuf)>
where
    I: IntoIterator<Item = std::io::Result<fs::DirEntry>>,
{
    let mut entries = Vec::new();
    for entry in listing {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => entries.push((name, path)),
            Err(raw) => debug!("skipping non UTF-8 file name {:?}", raw),
        }
    }
    entries
}

/// Put `value` into an empty slot. Returns `true` if the slot was already taken.
fn fill<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return true;
    }
    *slot = Some(value);
    false
}

fn ext_kind(name: &str) -> &'static str {
    let ext = parse_file_name(name).extension;
    if is_jpeg_extension(&ext) {
        "JPEG"
    } else if is_raw_extension(&ext) {
        "raw"
    } else {
        "PNG"
    }
}

/// Reorder a catalog in place.
///
/// The numeric orders key each record by the integer following `prefix` in
/// its file stem (see [`numeric_suffix`]). Records whose names don't parse
/// keep their positions; only parseable records are reordered, among the
/// slots they already occupy. The sort is stable and never fails.
pub fn sort_catalog(catalog: &mut Catalog, order: SortOrder, prefix: &str) {
    let descending = match order {
        SortOrder::Scan => return,
        SortOrder::NumericDesc => true,
        SortOrder::NumericAsc => false,
    };

    let keyed: Vec<(usize, u64)> = catalog
        .iter()
        .enumerate()
        .filter_map(|(i, r)| numeric_suffix(r.file_name(), prefix).map(|n| (i, n)))
        .collect();

    let slots: Vec<usize> = keyed.iter().map(|(i, _)| *i).collect();
    let mut ordered = keyed;
    if descending {
        ordered.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        ordered.sort_by(|a, b| a.1.cmp(&b.1));
    }

    let moved: Vec<ImageRecord> = ordered.iter().map(|(i, _)| catalog[*i].clone()).collect();
    for (slot, record) in slots.into_iter().zip(moved) {
        catalog[slot] = record;
    }
}
