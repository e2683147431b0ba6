//! Session snapshot types.
//!
//! A snapshot captures everything needed to restore an editing session:
//! the canvas transform, the main image, and the layer collection. Stores
//! treat the payload as an opaque blob.

use serde::{Deserialize, Serialize};

use crate::layer::LayerStack;
use crate::transport::EncodedRaster;

/// Viewer-side transform of the main canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// Complete state of an editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub canvas: CanvasTransform,

    /// Base image the layers are composed over.
    #[serde(default)]
    pub main_image: Option<EncodedRaster>,

    #[serde(default)]
    pub layers: LayerStack,
}

impl SessionSnapshot {
    /// Fresh session over a main image.
    pub fn new(main_image: EncodedRaster) -> Self {
        Self {
            main_image: Some(main_image),
            ..Self::default()
        }
    }
}

/// Descriptive metadata stored next to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotMeta {
    /// User-facing label.
    pub label: Option<String>,

    /// Generation prompt that produced the main image.
    pub prompt_used: Option<String>,

    /// Edit instructions applied so far, oldest first.
    pub edit_history: Vec<String>,
}
