//! Solid-colour base rasters.

use image::{Rgb, RgbImage};

use crate::raster::Raster;

/// Largest edge accepted for a generated background.
pub const MAX_SOLID_EXTENT: u32 = 4096;
pub const DEFAULT_SOLID_WIDTH: u32 = 1024;
pub const DEFAULT_SOLID_HEIGHT: u32 = 768;

/// Opaque RGB raster filled with `color` (`#rrggbb` or `rrggbb`).
///
/// Unparseable colours fall back to white. Dimensions are rounded and
/// clamped to `[1, 4096]`; non-finite or zero values use the defaults.
pub fn solid_background(color: &str, width: f64, height: f64) -> Raster {
    let [r, g, b] = parse_hex_color(color).unwrap_or([255, 255, 255]);
    let width = solid_extent(width, DEFAULT_SOLID_WIDTH);
    let height = solid_extent(height, DEFAULT_SOLID_HEIGHT);
    Raster::from_rgb(RgbImage::from_pixel(width, height, Rgb([r, g, b])))
}

/// Parse `#rrggbb` into channel bytes.
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.trim().trim_start_matches('#').as_bytes();
    if hex.len() < 6 || !hex[..6].iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let nibble = |b: u8| (b as char).to_digit(16).map(|d| d as u8);
    let channel = |i: usize| Some(nibble(hex[i])? << 4 | nibble(hex[i + 1])?);
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn solid_extent(value: f64, default: u32) -> u32 {
    if !value.is_finite() || value == 0.0 {
        return default;
    }
    value.round().clamp(1.0, MAX_SOLID_EXTENT as f64) as u32
}
