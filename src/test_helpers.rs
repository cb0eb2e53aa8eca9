//! Shared test utilities for the sift test suite.
//!
//! Builds photo folders on disk: empty placeholder files for scan tests, and
//! real JPEG/PNG rasters (optionally carrying an EXIF preview) for the
//! thumbnail paths.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! touch_all(tmp.path(), &["IMG_1.jpg", "IMG_1.orf"]);
//! write_jpeg(&tmp.path().join("IMG_2.jpg"), 2000, 1000);
//! let preview = write_jpeg_with_preview(&tmp.path().join("IMG_3.jpg"), 1000, 2000, 120, 160);
//! ```

use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// Placeholder files
// =========================================================================

/// Create an empty file for each name in `dir`.
pub fn touch_all(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"").unwrap();
    }
}

// =========================================================================
// Rasters
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

/// Encoded JPEG bytes of a `width × height` gradient.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write a JPEG whose EXIF block carries a `preview_width × preview_height`
/// thumbnail. Returns the embedded preview bytes.
pub fn write_jpeg_with_preview(
    path: &Path,
    width: u32,
    height: u32,
    preview_width: u32,
    preview_height: u32,
) -> Vec<u8> {
    let preview = jpeg_bytes(preview_width, preview_height);
    let full = with_exif_preview(&jpeg_bytes(width, height), &preview);
    std::fs::write(path, full).unwrap();
    preview
}

/// Splice an APP1 EXIF segment holding `preview` in as IFD1's JPEG
/// thumbnail, right after the SOI marker of `jpeg`.
pub fn with_exif_preview(jpeg: &[u8], preview: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");

    // Little-endian TIFF: header(8) + IFD0(2 + 12 + 4) + IFD1(2 + 2*12 + 4)
    const IFD0: u32 = 8;
    const IFD1: u32 = IFD0 + 2 + 12 + 4;
    const PREVIEW_OFFSET: u32 = IFD1 + 2 + 2 * 12 + 4;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&IFD0.to_le_bytes());

    // IFD0: Orientation = 1
    tiff.extend_from_slice(&1u16.to_le_bytes());
    push_entry(&mut tiff, 0x0112, 3, 1);
    tiff.extend_from_slice(&IFD1.to_le_bytes());

    // IFD1: JPEGInterchangeFormat / JPEGInterchangeFormatLength
    tiff.extend_from_slice(&2u16.to_le_bytes());
    push_entry(&mut tiff, 0x0201, 4, PREVIEW_OFFSET);
    push_entry(&mut tiff, 0x0202, 4, preview.len() as u32);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    assert_eq!(tiff.len() as u32, PREVIEW_OFFSET);
    tiff.extend_from_slice(preview);

    let segment_len = u16::try_from(2 + 6 + tiff.len()).expect("preview too large for APP1");
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// One 12-byte IFD entry with a single inline SHORT (3) or LONG (4) value.
fn push_entry(tiff: &mut Vec<u8>, tag: u16, kind: u16, value: u32) {
    tiff.extend_from_slice(&tag.to_le_bytes());
    tiff.extend_from_slice(&kind.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    if kind == 3 {
        tiff.extend_from_slice(&(value as u16).to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
    } else {
        tiff.extend_from_slice(&value.to_le_bytes());
    }
}

/// Dimensions of an encoded image held in memory.
pub fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}
