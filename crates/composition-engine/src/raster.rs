//! Decoded rasters.
//!
//! A [`Raster`] is the raw pixel-array form of an
//! [`EncodedRaster`]: always 8-bit, with either 3 (RGB) or 4 (RGBA)
//! channels. Values are immutable; every operation returns a new raster.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use recompose_common::config::ResampleFilter;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_model::geometry::Rectangle;
use recompose_model::transport::EncodedRaster;

use crate::transform::filter_type;

/// Pixel data with known dimensions and channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: DynamicImage,
}

impl Raster {
    /// Decode transport bytes into pixels.
    ///
    /// A non-image media type is a validation error; bytes that fail to
    /// parse are a decode error.
    pub fn decode(encoded: &EncodedRaster) -> RecomposeResult<Self> {
        if !encoded.media_type().to_ascii_lowercase().starts_with("image/") {
            return Err(RecomposeError::validation(format!(
                "unsupported media type: {}",
                encoded.media_type()
            )));
        }
        let image = image::load_from_memory(encoded.bytes())
            .map_err(|e| RecomposeError::decode(format!("{}: {e}", encoded.media_type())))?;
        Ok(Self::normalize(image))
    }

    /// Decode a data URL string.
    pub fn decode_data_url(data_url: &str) -> RecomposeResult<Self> {
        let encoded = EncodedRaster::parse(data_url)?;
        Self::decode(&encoded)
    }

    fn normalize(image: DynamicImage) -> Self {
        let image = if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.into_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.into_rgb8())
        };
        Self { image }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// 3 for RGB, 4 for RGBA.
    pub fn channels(&self) -> u8 {
        self.image.color().channel_count()
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// RGBA copy of the pixels; opaque alpha is synthesized when missing.
    pub fn to_rgba(&self) -> RgbaImage {
        self.image.to_rgba8()
    }

    /// RGBA value at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        use image::GenericImageView;
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y).0)
    }

    /// Copy out `rect`, preserving the channel layout.
    ///
    /// Returns `None` when the rectangle does not lie inside the raster.
    pub fn crop(&self, rect: Rectangle) -> Option<Raster> {
        if rect.width == 0 || rect.height == 0 || !rect.fits_within(self.width(), self.height()) {
            return None;
        }
        Some(Self {
            image: self.image.crop_imm(rect.x, rect.y, rect.width, rect.height),
        })
    }

    /// Resize to exactly `width x height`, ignoring aspect ratio.
    pub fn resize_exact(&self, width: u32, height: u32, filter: ResampleFilter) -> Raster {
        let (width, height) = (width.max(1), height.max(1));
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Self {
            image: self.image.resize_exact(width, height, filter_type(filter)),
        }
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> RecomposeResult<EncodedRaster> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RecomposeError::encode(e.to_string()))?;
        Ok(EncodedRaster::png(bytes))
    }
}
