//! Generative-image collaborator.

use std::fmt;

use async_trait::async_trait;
use recompose_common::config::ResampleFilter;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_engine::Raster;
use recompose_model::layer::Layer;
use recompose_model::transport::EncodedRaster;
use serde::{Deserialize, Serialize};

/// Service name used in collaborator errors.
pub const GENERATOR_SERVICE: &str = "generator";

/// Side length used when a generated layer size is not given.
pub const DEFAULT_LAYER_EXTENT: u32 = 256;

/// Largest side length of a generated layer.
pub const MAX_LAYER_EXTENT: u32 = 2048;

/// Longest model reply quoted back in an error message.
const REPLY_HINT_CHARS: usize = 100;

/// Aspect ratio hint passed through to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt sent to the generator, optionally with an image to edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EncodedRaster>,
}

/// What the generator sent back. Models may answer with text instead of
/// an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedImage {
    pub image: Option<EncodedRaster>,
    pub text: Option<String>,
}

impl GeneratedImage {
    pub fn image(image: EncodedRaster) -> Self {
        Self {
            image: Some(image),
            text: None,
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            image: None,
            text: Some(text.into()),
        }
    }

    /// The returned image, or a collaborator error quoting the model's reply.
    fn require_image(self, missing: &str) -> RecomposeResult<EncodedRaster> {
        match self.image {
            Some(image) if !image.bytes().is_empty() => Ok(image),
            _ => {
                let mut message = missing.to_string();
                let reply = self.text.as_deref().map(str::trim).unwrap_or_default();
                if !reply.is_empty() {
                    let hint: String = reply.chars().take(REPLY_HINT_CHARS).collect();
                    message.push_str(&format!(" Model replied: {hint}"));
                }
                Err(RecomposeError::collaborator(GENERATOR_SERVICE, message))
            }
        }
    }
}

/// Produces images from text prompts.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> RecomposeResult<GeneratedImage>;
}

/// Generate a base image for a new session.
pub async fn generate_base(
    generator: &dyn ImageGenerator,
    prompt: &str,
    aspect_ratio: Option<AspectRatio>,
) -> RecomposeResult<EncodedRaster> {
    let request = GenerationRequest {
        prompt: required_prompt(prompt)?,
        aspect_ratio,
        source: None,
    };
    tracing::info!(aspect = ?request.aspect_ratio, "Generating base image");

    generator
        .generate(&request)
        .await?
        .require_image("No image generated. Try a different prompt.")
}

/// Generate a single compositing layer, resized to fill `width x height`.
///
/// Missing or non-finite extents fall back to 256; others are rounded and
/// clamped into `[1, 2048]`. The result is always PNG.
pub async fn generate_layer(
    generator: &dyn ImageGenerator,
    prompt: &str,
    width: Option<f64>,
    height: Option<f64>,
) -> RecomposeResult<EncodedRaster> {
    let prompt = required_prompt(prompt)?;
    let (w, h) = (layer_extent(width), layer_extent(height));

    let request = GenerationRequest {
        prompt: format!(
            "{prompt} Single element or layer only, suitable for compositing. \
             Approximate size {w}x{h} pixels."
        ),
        aspect_ratio: None,
        source: None,
    };
    tracing::info!(width = w, height = h, "Generating layer");

    let generated = generator
        .generate(&request)
        .await?
        .require_image("No image generated for layer. Try a different prompt.")?;
    let raster = Raster::decode(&generated).map_err(|e| {
        RecomposeError::collaborator(
            GENERATOR_SERVICE,
            format!("No usable image generated for layer: {e}"),
        )
    })?;

    raster
        .resize_exact(w, h, ResampleFilter::default())
        .encode_png()
}

/// Edit a layer's pixels according to a free-text instruction.
///
/// Like background removal, the pre-edit pixels stay recoverable through
/// [`Layer::reset_raster`]. On failure the layer is left untouched.
pub async fn edit_layer(
    generator: &dyn ImageGenerator,
    layer: &mut Layer,
    instruction: &str,
) -> RecomposeResult<()> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(RecomposeError::validation("edit instruction is required"));
    }
    let source = layer.raster.clone().ok_or_else(|| {
        RecomposeError::validation(format!("layer {} has no raster to edit", layer.id))
    })?;

    let request = GenerationRequest {
        prompt: format!(
            "Edit this image according to the following instruction. Output only the \
             edited image, preserving size and composition where possible.\n\n\
             Instruction: {instruction}"
        ),
        aspect_ratio: None,
        source: Some(source),
    };
    tracing::info!(layer = %layer.id, "Editing layer");

    let edited = generator
        .generate(&request)
        .await?
        .require_image("No edited image returned. Try a clearer instruction.")?;
    let decoded = Raster::decode(&edited).map_err(|e| {
        RecomposeError::collaborator(GENERATOR_SERVICE, format!("unusable edited image: {e}"))
    })?;

    tracing::debug!(
        layer = %layer.id,
        width = decoded.width(),
        height = decoded.height(),
        "Layer edited"
    );
    layer.replace_raster(decoded.encode_png()?);
    Ok(())
}

fn required_prompt(prompt: &str) -> RecomposeResult<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(RecomposeError::validation("prompt is required"));
    }
    Ok(prompt.to_string())
}

fn layer_extent(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() => v.round().clamp(1.0, MAX_LAYER_EXTENT as f64) as u32,
        _ => DEFAULT_LAYER_EXTENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use image::{Rgb, RgbImage};
    use recompose_model::geometry::Rectangle;

    struct FakeGenerator {
        output: RecomposeResult<GeneratedImage>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeGenerator {
        fn returning(output: RecomposeResult<GeneratedImage>) -> Self {
            Self {
                output,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn image(w: u32, h: u32) -> Self {
            let raster = Raster::from_rgb(RgbImage::from_pixel(w, h, Rgb([0, 128, 255])));
            Self::returning(raster.encode_png().map(GeneratedImage::image))
        }
    }

    fn red_layer() -> Layer {
        let raster = Raster::from_rgb(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
        Layer::with_raster(Rectangle::new(0, 0, 4, 4), raster.encode_png().unwrap())
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn generate(&self, request: &GenerationRequest) -> RecomposeResult<GeneratedImage> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.output {
                Ok(output) => Ok(output.clone()),
                Err(e) => Err(RecomposeError::collaborator(GENERATOR_SERVICE, e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_before_calling() {
        let generator = FakeGenerator::image(4, 4);
        let err = generate_base(&generator, "   ", None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_base_passes_trimmed_prompt_and_aspect() {
        let generator = FakeGenerator::image(4, 4);
        let out = generate_base(&generator, "  a lighthouse ", Some(AspectRatio::Landscape))
            .await
            .unwrap();
        assert!(out.is_png());

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].prompt, "a lighthouse");
        assert_eq!(seen[0].aspect_ratio, Some(AspectRatio::Landscape));
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let generator = FakeGenerator::returning(Err(RecomposeError::collaborator(
            GENERATOR_SERVICE,
            "quota exceeded",
        )));
        let err = generate_base(&generator, "cat", None).await.unwrap_err();
        assert!(err.is_collaborator());
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_layer_is_resized_to_fill() {
        let generator = FakeGenerator::image(64, 16);
        let out = generate_layer(&generator, "a star", Some(100.4), Some(50.0))
            .await
            .unwrap();
        assert_eq!(Raster::decode(&out).unwrap().dimensions(), (100, 50));
        assert!(generator.seen.lock().unwrap()[0]
            .prompt
            .ends_with("Approximate size 100x50 pixels."));
    }

    #[tokio::test]
    async fn test_layer_extents_default_and_clamp() {
        let generator = FakeGenerator::image(8, 8);
        let out = generate_layer(&generator, "a star", None, Some(1e9)).await.unwrap();
        assert_eq!(Raster::decode(&out).unwrap().dimensions(), (256, 2048));

        let out = generate_layer(&generator, "a star", Some(f64::NAN), Some(-3.0))
            .await
            .unwrap();
        assert_eq!(Raster::decode(&out).unwrap().dimensions(), (256, 1));
    }

    #[tokio::test]
    async fn test_undecodable_layer_output_is_collaborator_error() {
        let generator = FakeGenerator::returning(Ok(GeneratedImage::image(EncodedRaster::png(
            vec![1, 2, 3],
        ))));
        let err = generate_layer(&generator, "a star", None, None).await.unwrap_err();
        assert!(err.is_collaborator());
    }

    #[tokio::test]
    async fn test_text_reply_without_image_is_quoted() {
        let reply = format!("I can't draw that. {}", "x".repeat(200));
        let generator = FakeGenerator::returning(Ok(GeneratedImage::text_only(reply)));
        let err = generate_base(&generator, "cat", None).await.unwrap_err();
        let message = err.to_string();
        assert!(err.is_collaborator());
        assert!(message.contains("No image generated"));
        assert!(message.contains("Model replied: I can't draw that."));
        assert!(!message.contains(&"x".repeat(100)));
    }

    #[tokio::test]
    async fn test_blank_instruction_is_rejected_before_calling() {
        let generator = FakeGenerator::image(4, 4);
        let mut layer = red_layer();
        let err = edit_layer(&generator, &mut layer, " \n ").await.unwrap_err();
        assert!(err.is_validation());
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_layer_without_raster_cannot_be_edited() {
        let generator = FakeGenerator::image(4, 4);
        let mut layer = Layer::empty(Rectangle::new(0, 0, 4, 4));
        let err = edit_layer(&generator, &mut layer, "make it blue").await.unwrap_err();
        assert!(err.is_validation());
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_replaces_raster_and_keeps_original() {
        let generator = FakeGenerator::image(4, 4);
        let mut layer = red_layer();
        let before = layer.raster.clone();

        edit_layer(&generator, &mut layer, "  make it blue ").await.unwrap();

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].prompt.ends_with("Instruction: make it blue"));
        assert_eq!(seen[0].source, before);

        let edited = Raster::decode(layer.raster.as_ref().unwrap()).unwrap();
        assert_eq!(edited.to_rgba().get_pixel(0, 0).0, [0, 128, 255, 255]);
        assert_eq!(layer.original_raster, before);

        layer.reset_raster();
        assert_eq!(layer.raster, before);
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_layer_untouched() {
        let mut layer = red_layer();
        let before = layer.clone();

        let garbage = FakeGenerator::returning(Ok(GeneratedImage::image(EncodedRaster::png(
            b"garbage".to_vec(),
        ))));
        let err = edit_layer(&garbage, &mut layer, "make it blue").await.unwrap_err();
        assert!(err.is_collaborator());
        assert_eq!(layer, before);

        let refused = FakeGenerator::returning(Ok(GeneratedImage::text_only("Sorry, no.")));
        let err = edit_layer(&refused, &mut layer, "make it blue").await.unwrap_err();
        assert!(err.to_string().contains("No edited image returned"));
        assert!(err.to_string().contains("Model replied: Sorry, no."));
        assert_eq!(layer, before);
    }

    #[test]
    fn test_aspect_ratio_wire_names() {
        assert_eq!(serde_json::to_string(&AspectRatio::Portrait).unwrap(), "\"9:16\"");
        assert_eq!(AspectRatio::Square.to_string(), "1:1");
    }
}
