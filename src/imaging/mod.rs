//! Thumbnail production, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Embedded preview** | `kamadak-exif`, IFD1 JPEG thumbnail |
//! | **Decode** | `image::ImageReader` over a cancel-aware reader |
//! | **Resize** | nearest-neighbor point sampling into the fitted box |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing what to produce
//! - **Backend**: [`ThumbnailBackend`] trait + [`RustBackend`]
//! - **Operations**: The cache → preview → resize chain for one source

pub mod backend;
mod calculations;
pub mod exif_preview;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{ThumbnailBackend, ThumbnailError};
pub use calculations::{fit_within, nearest_source};
pub use operations::{Thumbnail, ThumbnailOrigin, resolve_thumbnail};
pub use params::{Quality, ResizeParams, ThumbnailSettings};
pub use rust_backend::RustBackend;
