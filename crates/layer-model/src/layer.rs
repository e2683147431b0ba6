//! Layer types and the ordered layer collection.
//!
//! A layer is a positioned raster (or a text unit) contributing to a
//! composed image. Transform parameters are stored as edited by the user
//! and normalized on read: opacity to `[0, 1]`, scale to `[0.1, 5]`,
//! rotation modulo 360.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::geometry::{Rectangle, RegionKind};
use crate::transport::EncodedRaster;

/// Smallest accepted layer scale factor.
pub const MIN_SCALE: f64 = 0.1;
/// Largest accepted layer scale factor.
pub const MAX_SCALE: f64 = 5.0;

/// Identifier assigned to a layer by its [`LayerStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el-{}", self.0)
    }
}

/// What a layer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    #[default]
    Image,
    /// Metadata only; never rasterized by the engine.
    Text,
}

impl From<RegionKind> for LayerKind {
    fn from(kind: RegionKind) -> Self {
        match kind {
            RegionKind::Text => LayerKind::Text,
            RegionKind::Image | RegionKind::Background => LayerKind::Image,
        }
    }
}

/// A positioned, transformable unit of a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Assigned by [`LayerStack::add`]; zero until then.
    #[serde(default)]
    pub id: LayerId,

    #[serde(default)]
    pub kind: LayerKind,

    /// Current pixels. Absent for text layers and degenerate crops.
    #[serde(default)]
    pub raster: Option<EncodedRaster>,

    /// Pixels at extraction time, kept so edits can be reverted.
    #[serde(default)]
    pub original_raster: Option<EncodedRaster>,

    /// Placement on the base canvas, in pixels.
    pub rectangle: Rectangle,

    /// Opacity in `[0.0, 1.0]`.
    #[serde(default = "default_one")]
    pub opacity: f64,

    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation_degrees: f64,

    /// Uniform scale factor, clamped to `[0.1, 5.0]` on read.
    #[serde(default = "default_one")]
    pub scale: f64,

    /// Stacking priority; higher draws later.
    #[serde(default)]
    pub z_index: i32,

    /// Visible text for text layers.
    #[serde(default)]
    pub text_content: String,

    /// Text colour as a hex string.
    #[serde(default = "default_color")]
    pub color: String,

    /// Text font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_one() -> f64 {
    1.0
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_font_size() -> u32 {
    16
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

impl Layer {
    fn base(kind: LayerKind, rectangle: Rectangle) -> Self {
        Self {
            id: LayerId::default(),
            kind,
            raster: None,
            original_raster: None,
            rectangle,
            opacity: 1.0,
            rotation_degrees: 0.0,
            scale: 1.0,
            z_index: 0,
            text_content: String::new(),
            color: default_color(),
            font_size: default_font_size(),
            font_family: default_font_family(),
        }
    }

    /// An image layer placed at `rectangle`.
    pub fn with_raster(rectangle: Rectangle, raster: EncodedRaster) -> Self {
        Self {
            original_raster: Some(raster.clone()),
            raster: Some(raster),
            ..Self::base(LayerKind::Image, rectangle)
        }
    }

    /// An image layer whose crop degenerated; it has no pixels.
    pub fn empty(rectangle: Rectangle) -> Self {
        Self::base(LayerKind::Image, rectangle)
    }

    /// A text layer. Text is metadata only.
    pub fn text(rectangle: Rectangle, content: impl Into<String>) -> Self {
        Self {
            text_content: content.into(),
            ..Self::base(LayerKind::Text, rectangle)
        }
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Opacity clamped into `[0.0, 1.0]`; NaN counts as opaque.
    pub fn clamped_opacity(&self) -> f64 {
        if self.opacity.is_nan() {
            return 1.0;
        }
        self.opacity.clamp(0.0, 1.0)
    }

    /// Scale clamped into `[0.1, 5.0]`; NaN counts as 1.
    pub fn clamped_scale(&self) -> f64 {
        if self.scale.is_nan() {
            return 1.0;
        }
        self.scale.clamp(MIN_SCALE, MAX_SCALE)
    }

    /// Rotation reduced into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f64 {
        if !self.rotation_degrees.is_finite() {
            return 0.0;
        }
        let r = self.rotation_degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if r >= 360.0 {
            0.0
        } else {
            r
        }
    }

    pub fn has_raster(&self) -> bool {
        self.raster.is_some()
    }

    /// Replace the current pixels, keeping the original for [`Layer::reset_raster`].
    pub fn replace_raster(&mut self, raster: EncodedRaster) {
        if self.original_raster.is_none() {
            self.original_raster = self.raster.take();
        }
        self.raster = Some(raster);
    }

    /// Restore the pixels captured at extraction time.
    pub fn reset_raster(&mut self) {
        if let Some(original) = &self.original_raster {
            self.raster = Some(original.clone());
        }
    }
}

/// A partial update applied to a layer by user edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    pub rectangle: Option<Rectangle>,
    pub raster: Option<EncodedRaster>,
    pub opacity: Option<f64>,
    pub rotation_degrees: Option<f64>,
    pub scale: Option<f64>,
    pub z_index: Option<i32>,
    pub text_content: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<u32>,
    pub font_family: Option<String>,
}

impl LayerPatch {
    fn apply(self, layer: &mut Layer) {
        if let Some(rectangle) = self.rectangle {
            layer.rectangle = rectangle;
        }
        if let Some(raster) = self.raster {
            layer.replace_raster(raster);
        }
        if let Some(opacity) = self.opacity {
            layer.opacity = opacity;
        }
        if let Some(rotation) = self.rotation_degrees {
            layer.rotation_degrees = rotation;
        }
        if let Some(scale) = self.scale {
            layer.scale = scale;
        }
        if let Some(z_index) = self.z_index {
            layer.z_index = z_index;
        }
        if let Some(text) = self.text_content {
            layer.text_content = text;
        }
        if let Some(color) = self.color {
            layer.color = color;
        }
        if let Some(font_size) = self.font_size {
            layer.font_size = font_size;
        }
        if let Some(font_family) = self.font_family {
            layer.font_family = font_family;
        }
    }
}

/// Input to a composition: a base raster and the layers to draw over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRequest {
    pub base: EncodedRaster,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// An owned, ordered collection of layers.
///
/// Order here is the list order shown to the user; drawing order is decided
/// by `z_index` with ties broken by this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
    #[serde(default)]
    selected: Option<LayerId>,
    #[serde(default)]
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer, assigning it a fresh id.
    pub fn add(&mut self, mut layer: Layer) -> LayerId {
        // Stacks restored from older snapshots may lack a counter.
        let floor = self.layers.iter().map(|l| l.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(floor) + 1;
        layer.id = LayerId(self.next_id);
        self.layers.push(layer);
        LayerId(self.next_id)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Position of a layer in list order.
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Apply a partial update to one layer.
    pub fn update(&mut self, id: LayerId, patch: LayerPatch) -> Result<(), ModelError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer(id))?;
        patch.apply(layer);
        Ok(())
    }

    /// Remove a layer, clearing the selection if it pointed at it.
    pub fn remove(&mut self, id: LayerId) -> Result<Layer, ModelError> {
        let index = self.index_of(id).ok_or(ModelError::UnknownLayer(id))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(self.layers.remove(index))
    }

    /// Move the layer at `from` so it ends up at `to`.
    ///
    /// `to` past the end moves the layer to the end.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), ModelError> {
        let len = self.layers.len();
        if from >= len {
            return Err(ModelError::IndexOutOfRange { index: from, len });
        }
        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
        Ok(())
    }

    /// Select a layer, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<LayerId>) -> Result<(), ModelError> {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(ModelError::UnknownLayer(id));
            }
        }
        self.selected = id;
        Ok(())
    }

    pub fn selected(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.selected = None;
    }

    /// Build a composition request over `base` from the current layers.
    pub fn to_request(&self, base: EncodedRaster) -> CompositionRequest {
        CompositionRequest {
            base,
            layers: self.layers.clone(),
        }
    }
}

impl Extend<Layer> for LayerStack {
    fn extend<T: IntoIterator<Item = Layer>>(&mut self, iter: T) {
        for layer in iter {
            self.add(layer);
        }
    }
}
