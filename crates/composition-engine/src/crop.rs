//! Ad hoc fractional crops.

use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_model::geometry::FractionalRect;
use recompose_model::transport::EncodedRaster;

use crate::coords::map_fractional;
use crate::raster::Raster;

/// Crop `source` to a fractional rectangle.
///
/// Fractions are clamped before conversion, so any input produces a crop
/// of at least 1x1 pixels.
pub fn crop(source: &Raster, rect: FractionalRect) -> RecomposeResult<Raster> {
    let (width, height) = source.dimensions();
    let pixels = map_fractional(rect, width, height);
    source.crop(pixels).ok_or_else(|| {
        RecomposeError::validation(format!(
            "crop {pixels:?} does not fit a {width}x{height} source"
        ))
    })
}

/// Decode, crop, and re-encode as PNG.
pub fn crop_encoded(source: &EncodedRaster, rect: FractionalRect) -> RecomposeResult<EncodedRaster> {
    let source = Raster::decode(source)?;
    crop(&source, rect)?.encode_png()
}
