//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Arithmetic is integer with floor rounding, widened to `u64` so large
//! sources can't overflow.

/// Largest box with longer edge `max_size` that keeps the source aspect ratio.
///
/// The longer source edge becomes exactly `max_size`; the other edge is
/// `floor(other * max_size / longer)`. Squares map to `max_size × max_size`.
/// Sources are scaled up as well as down. An edge that would round to zero
/// is clamped to 1 so the thumbnail is never empty.
///
/// # Examples
/// ```
/// # use sift::imaging::fit_within;
/// assert_eq!(fit_within((2000, 1000), 300), (300, 150));
/// assert_eq!(fit_within((1000, 2000), 300), (150, 300));
/// ```
pub fn fit_within(source: (u32, u32), max_size: u32) -> (u32, u32) {
    let (width, height) = source;
    if width == 0 || height == 0 {
        return (0, 0);
    }
    if width > height {
        (max_size, scale_edge(height, max_size, width))
    } else {
        (scale_edge(width, max_size, height), max_size)
    }
}

/// `floor(edge * max_size / longer)`, at least 1.
fn scale_edge(edge: u32, max_size: u32, longer: u32) -> u32 {
    let scaled = u64::from(edge) * u64::from(max_size) / u64::from(longer);
    (scaled as u32).max(1)
}

/// Source coordinate sampled for output coordinate `dst` under nearest-neighbor
/// point sampling: `dst * src_len / dst_len`.
///
/// Always `< src_len` for `dst < dst_len`.
pub fn nearest_source(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    (u64::from(dst) * u64::from(src_len) / u64::from(dst_len)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // =========================================================================
    // fit_within
    // =========================================================================

    #[test]
    fn landscape_fits_width() {
        assert_eq!(fit_within((2000, 1000), 300), (300, 150));
    }

    #[test]
    fn portrait_fits_height() {
        assert_eq!(fit_within((1000, 2000), 300), (150, 300));
    }

    #[test]
    fn square_fits_both() {
        assert_eq!(fit_within((800, 800), 300), (300, 300));
    }

    #[test]
    fn floor_rounding() {
        // 4000x3000 @ 150: 3000*150/4000 = 112.5 → 112
        assert_eq!(fit_within((4000, 3000), 150), (150, 112));
        // 3000x4000 @ 300: 3000*300/4000 = 225
        assert_eq!(fit_within((3000, 4000), 300), (225, 300));
    }

    #[test]
    fn small_source_is_scaled_up() {
        assert_eq!(fit_within((100, 50), 300), (300, 150));
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel() {
        assert_eq!(fit_within((10000, 1), 300), (300, 1));
        assert_eq!(fit_within((1, 10000), 300), (1, 300));
    }

    #[test]
    fn empty_source_yields_empty_box() {
        assert_eq!(fit_within((0, 100), 300), (0, 0));
    }

    #[test]
    fn huge_source_does_not_overflow() {
        assert_eq!(fit_within((u32::MAX, u32::MAX / 2), 300), (300, 149));
    }

    // =========================================================================
    // nearest_source
    // =========================================================================

    #[test]
    fn nearest_source_downscale() {
        // 2000 → 300: output 0 samples 0, output 299 samples 1993
        assert_eq!(nearest_source(0, 300, 2000), 0);
        assert_eq!(nearest_source(1, 300, 2000), 6);
        assert_eq!(nearest_source(299, 300, 2000), 1993);
    }

    #[test]
    fn nearest_source_upscale_repeats_pixels() {
        assert_eq!(nearest_source(0, 4, 2), 0);
        assert_eq!(nearest_source(1, 4, 2), 0);
        assert_eq!(nearest_source(2, 4, 2), 1);
        assert_eq!(nearest_source(3, 4, 2), 1);
    }

    proptest! {
        #[test]
        fn fit_preserves_aspect(w in 1u32..20_000, h in 1u32..20_000, max in 1u32..2_000) {
            let (tw, th) = fit_within((w, h), max);
            let (long_src, short_src, long_out, short_out) =
                if w > h { (w, h, tw, th) } else { (h, w, th, tw) };
            prop_assert_eq!(long_out, max);
            let expected = (u64::from(short_src) * u64::from(max) / u64::from(long_src)).max(1);
            prop_assert!(u64::from(short_out).abs_diff(expected) <= 1);
            prop_assert!(short_out >= 1 && short_out <= max);
        }

        #[test]
        fn nearest_source_stays_in_bounds(dst_len in 1u32..5_000, src_len in 1u32..50_000, frac in 0.0f64..1.0) {
            let dst = ((f64::from(dst_len) * frac) as u32).min(dst_len - 1);
            prop_assert!(nearest_source(dst, dst_len, src_len) < src_len);
        }
    }
}
