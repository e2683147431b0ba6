//! External collaborators of the composition engine.
//!
//! Vision analysis, image generation, and background removal are
//! expressed as async traits. Their responses are untrusted: everything
//! they return is validated here before it reaches the pixel pipeline, and
//! every failure surfaces as [`RecomposeError::Collaborator`] carrying the
//! collaborator's own diagnostic.
//!
//! [`RecomposeError::Collaborator`]: recompose_common::RecomposeError::Collaborator

pub mod background;
pub mod generate;
pub mod pipeline;
pub mod vision;

pub use background::{remove_layer_background, BackgroundRemover};
pub use generate::{
    edit_layer, generate_base, generate_layer, AspectRatio, GeneratedImage, GenerationRequest,
    ImageGenerator,
};
pub use pipeline::extract_layers;
pub use vision::{parse_vision_response, VisionAnalyzer};
