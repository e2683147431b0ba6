//! Recompose Layer Model
//!
//! Defines the core data contracts for layered image editing:
//! - **Geometry:** Pixel rectangles, fractional rectangles, and the
//!   normalized `[0, 1000]` regions reported by vision models
//! - **Transport:** Self-describing data URL encoding for rasters
//! - **Layers:** Positioned, transformable raster or text units and the
//!   owned ordered collection that holds them
//! - **Session:** Canvas transform and snapshot payloads for persistence
//!
//! This crate holds data only. Pixel work lives in `recompose-engine`.

pub mod error;
pub mod geometry;
pub mod layer;
pub mod session;
pub mod transport;

pub use error::*;
pub use geometry::*;
pub use layer::*;
pub use session::*;
pub use transport::*;
