//! Per-layer transforms: scale, rotate, fade.
//!
//! The three steps are applied in a fixed order to the layer's own pixels:
//!
//! 1. **Scale** the layer rectangle by the clamped scale factor and resize
//!    the raster to exactly that box (aspect ratio is not preserved).
//! 2. **Rotate** about the raster center, growing the canvas to the rotated
//!    bounding box and filling new area with transparent pixels.
//! 3. **Fade** with [`apply_opacity`] when opacity is below 1.
//!
//! Rotation changes the output size, so callers must place the result
//! using [`TransformedLayer::width`]/[`TransformedLayer::height`], never
//! `scale x original`.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use recompose_common::config::ResampleFilter;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_model::layer::Layer;

use crate::opacity::apply_opacity;
use crate::raster::Raster;

/// A layer ready for placement.
#[derive(Debug, Clone)]
pub struct TransformedLayer {
    /// RGBA pixels after scale, rotation, and opacity.
    pub raster: Raster,
    pub width: u32,
    pub height: u32,
}

/// Applies scale, rotation, and opacity to single layers.
#[derive(Debug, Clone, Copy)]
pub struct LayerTransformer {
    filter: FilterType,
}

impl LayerTransformer {
    pub fn new(resample: ResampleFilter) -> Self {
        Self {
            filter: filter_type(resample),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ResampleFilter::default())
    }

    /// Decode and transform a layer's raster.
    pub fn transform(&self, layer: &Layer) -> RecomposeResult<TransformedLayer> {
        let encoded = layer.raster.as_ref().ok_or_else(|| {
            RecomposeError::validation(format!("layer {} has no raster", layer.id))
        })?;
        let source = Raster::decode(encoded)?;
        Ok(self.transform_raster(&source, layer))
    }

    /// Transform already-decoded pixels using `layer`'s parameters.
    pub fn transform_raster(&self, source: &Raster, layer: &Layer) -> TransformedLayer {
        let scale = layer.clamped_scale();
        let target_w = scaled_extent(layer.rectangle.width, scale);
        let target_h = scaled_extent(layer.rectangle.height, scale);

        let rgba = source.to_rgba();
        let mut pixels = if rgba.dimensions() == (target_w, target_h) {
            rgba
        } else {
            imageops::resize(&rgba, target_w, target_h, self.filter)
        };

        let rotation = layer.normalized_rotation();
        if rotation != 0.0 {
            pixels = rotate_expanded(&pixels, rotation);
        }

        let mut raster = Raster::from_rgba(pixels);
        let opacity = layer.clamped_opacity();
        if opacity < 1.0 {
            raster = apply_opacity(&raster, opacity);
        }

        let (width, height) = raster.dimensions();
        TransformedLayer {
            raster,
            width,
            height,
        }
    }
}

impl Default for LayerTransformer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub(crate) fn filter_type(resample: ResampleFilter) -> FilterType {
    match resample {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Gaussian => FilterType::Gaussian,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn scaled_extent(extent: u32, scale: f64) -> u32 {
    (extent.max(1) as f64 * scale).round().max(1.0) as u32
}

/// Rotate clockwise by `degrees` about the center, expanding the canvas.
fn rotate_expanded(image: &RgbaImage, degrees: f64) -> RgbaImage {
    // Quarter turns are exact and need no resampling.
    if degrees == 90.0 {
        return imageops::rotate90(image);
    }
    if degrees == 180.0 {
        return imageops::rotate180(image);
    }
    if degrees == 270.0 {
        return imageops::rotate270(image);
    }

    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (w, h) = (image.width() as f64, image.height() as f64);
    let out_w = bounding_extent(w * cos.abs() + h * sin.abs());
    let out_h = bounding_extent(w * sin.abs() + h * cos.abs());

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta as f32)
        * Projection::translate(-(w as f32) / 2.0, -(h as f32) / 2.0);

    let mut out = RgbaImage::from_pixel(out_w, out_h, Rgba([0, 0, 0, 0]));
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut out,
    );
    out
}

fn bounding_extent(value: f64) -> u32 {
    // Trim float noise so e.g. 100.0000001 does not grow a pixel.
    (value - 1e-6).ceil().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use recompose_model::geometry::Rectangle;
    use recompose_model::transport::EncodedRaster;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> Raster {
        Raster::from_rgba(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    fn layer(w: u32, h: u32) -> Layer {
        Layer::empty(Rectangle::new(0, 0, w, h))
    }

    #[test]
    fn test_identity_transform() {
        let source = solid(40, 20, [255, 0, 0, 255]);
        let out = LayerTransformer::default().transform_raster(&source, &layer(40, 20));
        assert_eq!((out.width, out.height), (40, 20));
        assert_eq!(out.raster.pixel(10, 10), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_scale_fills_box_without_keeping_aspect() {
        let source = solid(10, 10, [0, 0, 255, 255]);
        let out = LayerTransformer::default().transform_raster(&source, &layer(30, 10).scale(2.0));
        assert_eq!((out.width, out.height), (60, 20));
    }

    #[test]
    fn test_scale_is_clamped() {
        let source = solid(10, 10, [0, 0, 255, 255]);
        let out = LayerTransformer::default().transform_raster(&source, &layer(10, 10).scale(0.0));
        assert_eq!((out.width, out.height), (1, 1));

        let out = LayerTransformer::default().transform_raster(&source, &layer(10, 10).scale(50.0));
        assert_eq!((out.width, out.height), (50, 50));
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let source = solid(40, 10, [0, 255, 0, 255]);
        let out = LayerTransformer::default().transform_raster(&source, &layer(40, 10).rotation(90.0));
        assert_eq!((out.width, out.height), (10, 40));

        let out = LayerTransformer::default().transform_raster(&source, &layer(40, 10).rotation(-90.0));
        assert_eq!((out.width, out.height), (10, 40));
    }

    #[test]
    fn test_full_turn_is_no_rotation() {
        let source = solid(40, 10, [0, 255, 0, 255]);
        let out = LayerTransformer::default().transform_raster(&source, &layer(40, 10).rotation(360.0));
        assert_eq!((out.width, out.height), (40, 10));
    }

    #[test]
    fn test_diagonal_rotation_expands_with_transparent_corners() {
        let source = solid(100, 100, [0, 255, 0, 255]);
        let out = LayerTransformer::default().transform_raster(&source, &layer(100, 100).rotation(45.0));
        assert_eq!((out.width, out.height), (142, 142));
        assert_eq!(out.raster.pixel(0, 0).map(|p| p[3]), Some(0));
        let [_, g, _, a] = out.raster.pixel(71, 71).unwrap();
        assert!(g >= 254 && a >= 254);
    }

    #[test]
    fn test_opacity_applies_after_rotation() {
        let source = solid(20, 20, [0, 0, 0, 255]);
        let out = LayerTransformer::default()
            .transform_raster(&source, &layer(20, 20).rotation(30.0).opacity(0.5));
        let center_alpha = out.raster.pixel(out.width / 2, out.height / 2).unwrap()[3];
        assert!((127..=128).contains(&center_alpha));
        assert_eq!(out.raster.pixel(0, 0).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_missing_or_bad_raster_is_an_error() {
        let transformer = LayerTransformer::default();
        assert!(transformer.transform(&layer(5, 5)).is_err());

        let bad = Layer::with_raster(Rectangle::new(0, 0, 5, 5), EncodedRaster::png(vec![0, 1]));
        let err = transformer.transform(&bad).unwrap_err();
        assert!(matches!(err, RecomposeError::Decode { .. }));
    }
}
