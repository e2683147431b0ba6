//! Rectangle and region types for layer placement.
//!
//! Three coordinate spaces meet here:
//! - [`Rectangle`]: absolute pixels on a concrete canvas.
//! - [`FractionalRect`]: fractions of the canvas in `[0.0, 1.0]`.
//! - [`NormalizedRegion`]: integer vision-model coordinates in `[0, 1000]`.

use serde::{Deserialize, Serialize};

/// Upper bound of the vision-model coordinate space.
pub const NORMALIZED_SCALE: u32 = 1000;

/// An axis-aligned rectangle in pixel units.
///
/// `width` and `height` are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    /// Create a rectangle, raising zero extents to 1.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Rectangle covering a whole `width x height` canvas.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// The center point in (fractional) pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the rectangle lies fully inside a `width x height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }
}

/// A rectangle expressed as fractions of the canvas.
///
/// Values are clamped on construction: `left`/`top` into `[0.0, 1.0]`,
/// `width`/`height` into `[0.01, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionalRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl FractionalRect {
    /// The full canvas.
    pub const FULL: FractionalRect = FractionalRect {
        left: 0.0,
        top: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Create a fractional rectangle, clamping values to valid range.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left: clamp_unit(left, 0.0),
            top: clamp_unit(top, 0.0),
            width: clamp_unit(width, 0.01), // minimum 1% width
            height: clamp_unit(height, 0.01), // minimum 1% height
        }
    }

    /// Re-apply the clamping rules, e.g. after deserializing untrusted input.
    pub fn clamped(&self) -> Self {
        Self::new(self.left, self.top, self.width, self.height)
    }
}

impl Default for FractionalRect {
    fn default() -> Self {
        Self::FULL
    }
}

fn clamp_unit(value: f64, min: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, 1.0)
}

/// Semantic class of a vision-reported region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// A visual element (object, shape, figure, logo).
    Image,
    /// A text overlay; carries `text_content` and never a raster.
    Text,
    /// The base layer covering the whole image.
    Background,
}

/// A region of interest in vision-model coordinates.
///
/// All coordinates are integers in `[0, 1000]` relative to the analysed
/// image. Values are advisory and must be mapped to pixels (with clipping)
/// before touching any raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRegion {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub text_content: String,
}

impl NormalizedRegion {
    /// Create a region, clamping every coordinate into `[0, 1000]`.
    pub fn new(kind: RegionKind, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            kind,
            x: x.min(NORMALIZED_SCALE),
            y: y.min(NORMALIZED_SCALE),
            width: width.min(NORMALIZED_SCALE),
            height: height.min(NORMALIZED_SCALE),
            text_content: String::new(),
        }
    }

    /// Region covering the full image.
    pub fn background() -> Self {
        Self::new(
            RegionKind::Background,
            0,
            0,
            NORMALIZED_SCALE,
            NORMALIZED_SCALE,
        )
    }

    /// Text region with its visible content (trimmed).
    pub fn text(x: u32, y: u32, width: u32, height: u32, content: impl AsRef<str>) -> Self {
        Self {
            text_content: content.as_ref().trim().to_string(),
            ..Self::new(RegionKind::Text, x, y, width, height)
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == RegionKind::Text
    }
}
