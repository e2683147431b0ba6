//! Coordinate mapping from normalized and fractional spaces to pixels.
//!
//! Every mapped rectangle is clipped so it lies fully inside
//! `[0, width) x [0, height)` with both extents at least 1. A region that
//! falls entirely outside the canvas degenerates to a 1x1 rectangle at the
//! clipped corner; that is ordinary output, not an error.

use recompose_model::geometry::{FractionalRect, NormalizedRegion, Rectangle, NORMALIZED_SCALE};

/// Map a vision region (`[0, 1000]` space) onto a `target_width x target_height` canvas.
pub fn map_region(region: &NormalizedRegion, target_width: u32, target_height: u32) -> Rectangle {
    let sx = target_width as f64 / NORMALIZED_SCALE as f64;
    let sy = target_height as f64 / NORMALIZED_SCALE as f64;
    clip_to_canvas(
        region.x as f64 * sx,
        region.y as f64 * sy,
        region.width as f64 * sx,
        region.height as f64 * sy,
        target_width,
        target_height,
    )
}

/// Map a fractional rectangle onto a `target_width x target_height` canvas.
///
/// `left`/`top` are clamped into `[0, 1]` and `width`/`height` into
/// `[0.01, 1]` before conversion.
pub fn map_fractional(rect: FractionalRect, target_width: u32, target_height: u32) -> Rectangle {
    let rect = rect.clamped();
    clip_to_canvas(
        rect.left * target_width as f64,
        rect.top * target_height as f64,
        rect.width * target_width as f64,
        rect.height * target_height as f64,
        target_width,
        target_height,
    )
}

/// Round pixel coordinates and clip them into the canvas.
fn clip_to_canvas(x: f64, y: f64, w: f64, h: f64, canvas_w: u32, canvas_h: u32) -> Rectangle {
    let canvas_w = canvas_w.max(1) as i64;
    let canvas_h = canvas_h.max(1) as i64;

    let left = round_px(x).clamp(0, canvas_w - 1);
    let top = round_px(y).clamp(0, canvas_h - 1);
    let width = round_px(w).max(1).min(canvas_w - left);
    let height = round_px(h).max(1).min(canvas_h - top);

    Rectangle::new(left as u32, top as u32, width as u32, height as u32)
}

fn round_px(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use recompose_model::geometry::RegionKind;

    #[test]
    fn test_background_region_covers_canvas_exactly() {
        for (w, h) in [(800, 600), (1, 1), (1023, 767), (3, 4096)] {
            let rect = map_region(&NormalizedRegion::background(), w, h);
            assert_eq!(rect, Rectangle::new(0, 0, w, h));
        }
    }

    #[test]
    fn test_scales_and_rounds() {
        let region = NormalizedRegion::new(RegionKind::Image, 250, 500, 100, 100);
        let rect = map_region(&region, 1024, 768);
        assert_eq!(rect, Rectangle::new(256, 384, 102, 77));
    }

    #[test]
    fn test_region_past_far_corner_degenerates_to_one_pixel() {
        let region = NormalizedRegion::new(RegionKind::Image, 1000, 1000, 0, 0);
        let rect = map_region(&region, 800, 600);
        assert_eq!(rect, Rectangle::new(799, 599, 1, 1));
    }

    #[test]
    fn test_overflowing_region_is_clipped() {
        let region = NormalizedRegion::new(RegionKind::Image, 900, 900, 500, 500);
        let rect = map_region(&region, 100, 100);
        assert_eq!(rect, Rectangle::new(90, 90, 10, 10));
    }

    #[test]
    fn test_fractional_full_matches_source() {
        let rect = map_fractional(FractionalRect::FULL, 640, 480);
        assert_eq!(rect, Rectangle::new(0, 0, 640, 480));
    }

    #[test]
    fn test_fractional_clamps_before_conversion() {
        let raw = FractionalRect {
            left: -3.0,
            top: 0.5,
            width: 0.0,
            height: 9.0,
        };
        let rect = map_fractional(raw, 1000, 200);
        assert_eq!(rect, Rectangle::new(0, 100, 10, 100));
    }

    proptest! {
        #[test]
        fn prop_region_always_inside_canvas(
            x in 0u32..=1000, y in 0u32..=1000,
            w in 0u32..=1000, h in 0u32..=1000,
            cw in 1u32..5000, ch in 1u32..5000,
        ) {
            let region = NormalizedRegion::new(RegionKind::Image, x, y, w, h);
            let rect = map_region(&region, cw, ch);
            prop_assert!(rect.width >= 1 && rect.height >= 1);
            prop_assert!(rect.fits_within(cw, ch));
        }

        #[test]
        fn prop_fractional_always_inside_canvas(
            l in -2.0f64..3.0, t in -2.0f64..3.0,
            w in -2.0f64..3.0, h in -2.0f64..3.0,
            cw in 1u32..5000, ch in 1u32..5000,
        ) {
            let rect = map_fractional(FractionalRect { left: l, top: t, width: w, height: h }, cw, ch);
            prop_assert!(rect.width >= 1 && rect.height >= 1);
            prop_assert!(rect.fits_within(cw, ch));
        }
    }
}
