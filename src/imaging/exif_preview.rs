//! Embedded EXIF preview extraction.
//!
//! Cameras store a small JPEG in IFD1 of the EXIF block, located by the
//! `JPEGInterchangeFormat` (offset) and `JPEGInterchangeFormatLength` tags.
//! The offset is relative to the start of the TIFF header, which is exactly
//! what [`exif::Exif::buf`] holds, so the preview is a plain slice of it.
//!
//! Only EXIF parsing happens here. The full image is never decoded.

use super::backend::ThumbnailError;
use exif::{In, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Read the embedded preview of the JPEG at `path`.
///
/// Fails with [`ThumbnailError::NoMetadata`] when the file carries no
/// parseable EXIF block, and with [`ThumbnailError::NoEmbeddedPreview`] when
/// the block has no usable thumbnail.
pub fn read_embedded_preview(path: &Path) -> Result<Vec<u8>, ThumbnailError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|_| ThumbnailError::NoMetadata(path.to_path_buf()))?;

    preview_slice(&exif)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| ThumbnailError::NoEmbeddedPreview(path.to_path_buf()))
}

/// The IFD1 thumbnail inside a parsed EXIF block, if it is present, in
/// bounds and looks like a JPEG.
fn preview_slice(exif: &exif::Exif) -> Option<&[u8]> {
    let offset = thumbnail_uint(exif, Tag::JPEGInterchangeFormat)? as usize;
    let length = thumbnail_uint(exif, Tag::JPEGInterchangeFormatLength)? as usize;
    if length == 0 {
        return None;
    }
    let bytes = exif.buf().get(offset..offset.checked_add(length)?)?;
    bytes.starts_with(&JPEG_SOI).then_some(bytes)
}

fn thumbnail_uint(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::THUMBNAIL)?.value.get_uint(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn extracts_embedded_preview_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("IMG_1.jpg");
        let expected = write_jpeg_with_preview(&path, 640, 480, 160, 120);

        let preview = read_embedded_preview(&path).unwrap();
        assert_eq!(preview, expected);
        assert_eq!(decoded_dimensions(&preview), (160, 120));
    }

    #[test]
    fn jpeg_without_exif_is_no_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        write_jpeg(&path, 64, 64);

        let err = read_embedded_preview(&path).unwrap_err();
        assert!(matches!(err, ThumbnailError::NoMetadata(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn exif_without_thumbnail_tags_is_no_preview() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nothumb.jpg");
        // Zero-length preview: tags present but unusable
        std::fs::write(&path, with_exif_preview(&jpeg_bytes(64, 64), &[])).unwrap();

        let err = read_embedded_preview(&path).unwrap_err();
        assert!(matches!(err, ThumbnailError::NoEmbeddedPreview(_)));
    }

    #[test]
    fn preview_that_is_not_a_jpeg_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("garbage.jpg");
        std::fs::write(
            &path,
            with_exif_preview(&jpeg_bytes(64, 64), b"not a jpeg at all"),
        )
        .unwrap();

        let err = read_embedded_preview(&path).unwrap_err();
        assert!(matches!(err, ThumbnailError::NoEmbeddedPreview(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_embedded_preview(Path::new("/nonexistent/IMG_1.jpg")).unwrap_err();
        assert!(matches!(err, ThumbnailError::Io(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn empty_file_is_no_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(
            read_embedded_preview(&path),
            Err(ThumbnailError::NoMetadata(_))
        ));
    }
}
