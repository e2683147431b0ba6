//! Recompose Engine: the raster composition core
//!
//! Turns a base image and an ordered set of layers into crops and a final
//! composited image.
//!
//! # Pipeline
//!
//! ```text
//! vision regions ──► coords::map_region ──► RegionExtractor ──► layers
//!                                                                 │
//! base raster ──────────────────────────────┐                     ▼
//!                                           │        LayerTransformer
//!                                           │   (scale → rotate → opacity)
//!                                           ▼                     │
//!                                 CompositionEngine ◄─────────────┘
//!                                 (z-sort, center placement,
//!                                  off-canvas drop, over-blend)
//!                                           │
//!                                           ▼
//!                                      PNG data URL
//! ```
//!
//! Everything here is synchronous CPU work with no shared mutable state.
//! Per-layer transforms may run on the rayon pool; blending is sequential.

pub mod compose;
pub mod coords;
pub mod crop;
pub mod extract;
pub mod opacity;
pub mod raster;
pub mod solid;
pub mod transform;

pub use compose::{compose_with_budget, CompositionEngine, CompositionResult};
pub use extract::RegionExtractor;
pub use raster::Raster;
pub use transform::{LayerTransformer, TransformedLayer};
