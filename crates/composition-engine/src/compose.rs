//! Full recomposition of a base raster and its layers.
//!
//! # Algorithm
//!
//! 1. **Filter** out layers without pixels (text is never auto-rasterized).
//! 2. **Sort** ascending by `z_index`. The sort is stable: equal z-indices
//!    keep input order, so the later one draws on top.
//! 3. **Transform** each layer (scale, rotate, fade). Layers are independent
//!    here and may run in parallel.
//! 4. **Place** each result centered on the center of the layer's original
//!    rectangle.
//! 5. **Drop** placements with no positive-area overlap with the canvas.
//! 6. **Blend** survivors onto the base in sorted order with over-compositing.
//!    This step is sequential; over-blending does not commute.
//!
//! The canvas never grows. Overflow is clipped at blit time.

use std::sync::Arc;
use std::time::Duration;

use image::imageops;
use rayon::prelude::*;
use recompose_common::config::CompositionDefaults;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_model::geometry::Rectangle;
use recompose_model::layer::{CompositionRequest, Layer, LayerId};
use recompose_model::transport::EncodedRaster;

use crate::raster::Raster;
use crate::transform::{LayerTransformer, TransformedLayer};

/// Where a transformed layer lands on the canvas. May extend past any edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Center a `width x height` raster on the center of `anchor`.
    pub fn centered_on(anchor: &Rectangle, width: u32, height: u32) -> Self {
        let (cx, cy) = anchor.center();
        Self {
            left: (cx - width as f64 / 2.0).round() as i64,
            top: (cy - height as f64 / 2.0).round() as i64,
            width,
            height,
        }
    }

    /// Whether any pixel of the placement lands on the canvas.
    pub fn intersects_canvas(&self, canvas_width: u32, canvas_height: u32) -> bool {
        let right = self.left + self.width as i64;
        let bottom = self.top + self.height as i64;
        self.width > 0
            && self.height > 0
            && self.left < canvas_width as i64
            && self.top < canvas_height as i64
            && right > 0
            && bottom > 0
    }
}

/// Why a layer did not reach the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Text layer or degenerate crop.
    NoRaster,
    /// The layer's pixels could not be decoded.
    Undecodable(String),
    /// The placement lies entirely outside the canvas.
    OffCanvas,
}

/// A layer left out of the composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLayer {
    pub id: LayerId,
    pub reason: SkipReason,
}

/// Composed pixels plus what happened to each layer.
#[derive(Debug, Clone)]
pub struct CompositionOutcome {
    pub raster: Raster,
    /// Drawn layers, bottom to top.
    pub placed: Vec<(LayerId, Placement)>,
    pub skipped: Vec<SkippedLayer>,
}

/// Encoded output of [`CompositionEngine::compose`].
#[derive(Debug, Clone)]
pub struct CompositionResult {
    /// PNG at the base raster's dimensions.
    pub raster: EncodedRaster,
    pub width: u32,
    pub height: u32,
    pub placed: Vec<(LayerId, Placement)>,
    pub skipped: Vec<SkippedLayer>,
}

/// The composition engine.
#[derive(Debug, Clone)]
pub struct CompositionEngine {
    transformer: LayerTransformer,
    parallel: bool,
}

impl CompositionEngine {
    pub fn new(config: &CompositionDefaults) -> Self {
        Self {
            transformer: LayerTransformer::new(config.resample),
            parallel: config.parallel_transforms,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&CompositionDefaults::default())
    }

    /// Compose a request end to end.
    ///
    /// Fails only when the base raster cannot be decoded or the output
    /// cannot be encoded. Individual bad layers are skipped.
    pub fn compose(&self, request: &CompositionRequest) -> RecomposeResult<CompositionResult> {
        let base = Raster::decode(&request.base)?;
        let outcome = self.compose_raster(&base, &request.layers);
        let (width, height) = outcome.raster.dimensions();

        tracing::info!(
            width,
            height,
            placed = outcome.placed.len(),
            skipped = outcome.skipped.len(),
            "Composition complete"
        );

        Ok(CompositionResult {
            raster: outcome.raster.encode_png()?,
            width,
            height,
            placed: outcome.placed,
            skipped: outcome.skipped,
        })
    }

    /// Compose decoded pixels.
    pub fn compose_raster(&self, base: &Raster, layers: &[Layer]) -> CompositionOutcome {
        let mut skipped = Vec::new();

        let mut drawable: Vec<&Layer> = Vec::with_capacity(layers.len());
        for layer in layers {
            if layer.has_raster() {
                drawable.push(layer);
            } else {
                skipped.push(SkippedLayer {
                    id: layer.id,
                    reason: SkipReason::NoRaster,
                });
            }
        }

        // Vec::sort_by_key is stable.
        drawable.sort_by_key(|layer| layer.z_index);

        let transformed: Vec<RecomposeResult<TransformedLayer>> = if self.parallel {
            drawable
                .par_iter()
                .map(|layer| self.transformer.transform(layer))
                .collect()
        } else {
            drawable
                .iter()
                .map(|layer| self.transformer.transform(layer))
                .collect()
        };

        let (canvas_w, canvas_h) = base.dimensions();
        let mut canvas = base.to_rgba();
        let mut placed = Vec::with_capacity(drawable.len());

        for (layer, result) in drawable.into_iter().zip(transformed) {
            let transformed = match result {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(layer = %layer.id, error = %e, "Skipping undecodable layer");
                    skipped.push(SkippedLayer {
                        id: layer.id,
                        reason: SkipReason::Undecodable(e.to_string()),
                    });
                    continue;
                }
            };

            let placement =
                Placement::centered_on(&layer.rectangle, transformed.width, transformed.height);
            if !placement.intersects_canvas(canvas_w, canvas_h) {
                tracing::debug!(layer = %layer.id, ?placement, "Layer lies off canvas; dropped");
                skipped.push(SkippedLayer {
                    id: layer.id,
                    reason: SkipReason::OffCanvas,
                });
                continue;
            }

            tracing::debug!(
                layer = %layer.id,
                left = placement.left,
                top = placement.top,
                width = placement.width,
                height = placement.height,
                "Blending layer"
            );
            imageops::overlay(
                &mut canvas,
                transformed.raster.as_dynamic(),
                placement.left,
                placement.top,
            );
            placed.push((layer.id, placement));
        }

        // Keep the base's channel layout.
        let raster = if base.has_alpha() {
            Raster::from_rgba(canvas)
        } else {
            Raster::from_rgb(image::DynamicImage::ImageRgba8(canvas).into_rgb8())
        };

        CompositionOutcome {
            raster,
            placed,
            skipped,
        }
    }
}

impl Default for CompositionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run [`CompositionEngine::compose`] on the blocking pool under a time budget.
///
/// The budget covers the whole call. On expiry the caller gets
/// [`RecomposeError::Timeout`]; the blocking task finishes in the
/// background and its result is discarded.
pub async fn compose_with_budget(
    engine: Arc<CompositionEngine>,
    request: CompositionRequest,
    budget: Duration,
) -> RecomposeResult<CompositionResult> {
    let task = tokio::task::spawn_blocking(move || engine.compose(&request));
    match tokio::time::timeout(budget, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(RecomposeError::Other(anyhow::anyhow!(
            "composition task failed: {join_error}"
        ))),
        Err(_) => Err(RecomposeError::Timeout {
            budget_ms: budget.as_millis() as u64,
        }),
    }
}
