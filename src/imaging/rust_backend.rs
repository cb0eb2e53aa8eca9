//! Pure Rust thumbnail backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Embedded preview | `kamadak-exif` (IFD1 JPEG thumbnail) |
//! | Decode (JPEG, PNG) | `image::ImageReader` over a cancelable reader |
//! | Resample | nearest-neighbor point sampling |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{ThumbnailBackend, ThumbnailError};
use super::calculations::{fit_within, nearest_source};
use super::exif_preview::read_embedded_preview;
use super::params::{Quality, ResizeParams};
use crate::cancel::{CancelToken, CancelableReader};
use crate::naming::normalized_extension;
use crate::scan::is_raw_extension;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an image from disk, reading through `cancel`.
///
/// The format is sniffed from content, so a PNG saved as `.jpg` still decodes.
fn load_image(path: &Path, cancel: &CancelToken) -> Result<DynamicImage, ThumbnailError> {
    if is_raw_extension(&normalized_extension(path)) {
        return Err(ThumbnailError::UnsupportedSource(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(CancelableReader::new(file, cancel.clone()));
    ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| decode_error(path, e, cancel))?
        .decode()
        .map_err(|e| decode_error(path, e, cancel))
}

fn decode_error(path: &Path, err: impl std::fmt::Display, cancel: &CancelToken) -> ThumbnailError {
    if cancel.is_cancelled() {
        return ThumbnailError::Cancelled;
    }
    ThumbnailError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Nearest-neighbor resample of `src` to `width × height`.
///
/// Checks `cancel` once per output row.
fn resample_nearest(
    src: &RgbImage,
    width: u32,
    height: u32,
    cancel: &CancelToken,
) -> Result<RgbImage, ThumbnailError> {
    let mut out = RgbImage::new(width, height);
    for y in 0..height {
        if cancel.is_cancelled() {
            return Err(ThumbnailError::Cancelled);
        }
        let sy = nearest_source(y, height, src.height());
        for x in 0..width {
            let sx = nearest_source(x, width, src.width());
            out.put_pixel(x, y, *src.get_pixel(sx, sy));
        }
    }
    Ok(out)
}

fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>, ThumbnailError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.value() as u8)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(bytes)
}

impl ThumbnailBackend for RustBackend {
    fn extract_preview(&self, source: &Path) -> Result<Vec<u8>, ThumbnailError> {
        read_embedded_preview(source)
    }

    fn resize(
        &self,
        params: &ResizeParams,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, ThumbnailError> {
        let img = load_image(&params.source, cancel)?.to_rgb8();
        let (width, height) = fit_within(img.dimensions(), params.max_size);
        if width == 0 || height == 0 {
            return Err(ThumbnailError::Decode {
                path: params.source.clone(),
                message: "image has no pixels".into(),
            });
        }

        let thumb = resample_nearest(&img, width, height, cancel)?;
        encode_jpeg(&thumb, params.quality)
    }
}
