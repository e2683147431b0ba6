//! Alpha-channel opacity scaling.

use image::RgbaImage;

use crate::raster::Raster;

/// Multiply every pixel's alpha by `opacity`.
///
/// Color channels are untouched and alpha is rounded to the nearest
/// integer. A raster without alpha gets an opaque channel first.
/// `opacity >= 1` returns the input unchanged. Repeated application
/// compounds: two passes at 0.5 leave a quarter of the alpha.
pub fn apply_opacity(raster: &Raster, opacity: f64) -> Raster {
    let opacity = if opacity.is_nan() {
        1.0
    } else {
        opacity.clamp(0.0, 1.0)
    };
    if opacity >= 1.0 {
        return raster.clone();
    }

    let mut pixels = raster.to_rgba();
    scale_alpha(&mut pixels, opacity);
    Raster::from_rgba(pixels)
}

/// In-place alpha multiplication over a raw RGBA buffer.
pub fn scale_alpha(pixels: &mut RgbaImage, opacity: f64) {
    for pixel in pixels.pixels_mut() {
        pixel[3] = (pixel[3] as f64 * opacity).round() as u8;
    }
}
