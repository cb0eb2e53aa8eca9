//! # Sift
//!
//! The core of a photo-folder browser: list a folder's images, pair raw files
//! with their JPEGs, and keep a thumbnail for every image ready as fast as
//! possible.
//!
//! # Architecture: Scan → Pair → Cache → Thumbnail
//!
//! ```text
//! folder/  →  scan  →  Catalog  →  pipeline  →  one unit per record
//!                                                 ├─ cache hit?      → done
//!                                                 ├─ EXIF preview?   → store
//!                                                 └─ decode + resize → store
//! ```
//!
//! Each unit reports exactly one outcome. Units complete in any order and the
//! display layer merges them into its copy of the catalog as they arrive.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists a folder, filters extensions, pairs raw + display siblings, numeric-suffix sort |
//! | [`cache`] | Path-addressed thumbnail cache, atomic stores, single-flight locks, run stats |
//! | [`imaging`] | EXIF preview extraction, decode/resize/encode backend, the per-record resolution chain |
//! | [`pipeline`] | Runs one unit per record on a worker pool: blocking, callback or background |
//! | [`session`] | The folder being browsed: cancels abandoned work, holds ratings |
//! | [`cancel`] | Cancel tokens and a reader that aborts decodes |
//! | [`config`] | `sift.toml` loading over stock defaults, validation |
//! | [`types`] | `ImageRecord` and `Catalog` |
//! | [`naming`] | Filename → basename / extension / numeric suffix |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Existence Is the Cache
//!
//! A thumbnail's location is a pure function of the source path, so a lookup
//! is a single `stat`. There is no index to load, lock or corrupt, and
//! several processes can share the cache directory. The price is that an
//! image edited in place keeps its old thumbnail.
//!
//! ## Cheapest Source First
//!
//! Most camera JPEGs carry a small preview in their EXIF block. Copying it
//! out costs one header read instead of decoding a 20-megapixel image, so it
//! is always tried first. Resizing is the fallback, not the plan.
//!
//! ## Nothing Outlives Its Folder
//!
//! Switching folders cancels the previous folder's work. Queued units report
//! `Cancelled` without touching the disk and running decodes abort at their
//! next read. A unit that hangs is abandoned after a timeout. Either way the
//! caller still receives one outcome per record.

pub mod cache;
pub mod cancel;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
