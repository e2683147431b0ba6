//! Vision-analysis collaborator and response ingestion.

use async_trait::async_trait;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_model::geometry::{NormalizedRegion, RegionKind, NORMALIZED_SCALE};
use recompose_model::transport::EncodedRaster;
use serde::Deserialize;

/// Service name used in collaborator errors.
pub const VISION_SERVICE: &str = "vision";

/// Finds the semantic regions of an image.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyze `image` and return the raw JSON response text.
    ///
    /// The expected shape is
    /// `{"regions":[{"type":"image|text|background","x":..,"y":..,"width":..,"height":..,"textContent":".."}]}`
    /// with coordinates in `[0, 1000]`. Implementations should ask for at
    /// most `max_regions` entries; extra entries are dropped downstream.
    async fn analyze(&self, image: &EncodedRaster, max_regions: usize) -> RecomposeResult<String>;
}

/// Instructions sent alongside the image to the vision collaborator.
pub fn analysis_instructions(max_regions: usize) -> String {
    format!(
        "List the distinct layers (semantic elements) of this image so they can be cropped out exactly.\n\
         - Return up to {max_regions} layers.\n\
         - Coordinates are integers normalized to 0-{NORMALIZED_SCALE}: x, y is the top-left corner; width, height the size.\n\
         - Include one \"background\" layer covering the whole image.\n\
         - Text overlays use type \"text\" with textContent set to the visible text.\n\
         - Every other visual element uses type \"image\" with a tight bounding box."
    )
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    regions: Vec<WireRegion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRegion {
    #[serde(rename = "type")]
    kind: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    text_content: Option<String>,
}

/// Validate a vision response and turn it into regions.
///
/// Coordinates are rounded and clamped into `[0, 1000]`. Regions with an
/// unknown `type` are dropped. A blank response, malformed JSON, or a
/// response with no usable region is a collaborator error.
pub fn parse_vision_response(text: &str) -> RecomposeResult<Vec<NormalizedRegion>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RecomposeError::collaborator(
            VISION_SERVICE,
            "No regions returned from vision model",
        ));
    }

    let response: WireResponse = serde_json::from_str(text).map_err(|e| {
        RecomposeError::collaborator(VISION_SERVICE, format!("Malformed region response: {e}"))
    })?;

    let mut regions = Vec::with_capacity(response.regions.len());
    for wire in response.regions {
        let kind = match wire.kind.trim().to_ascii_lowercase().as_str() {
            "image" => RegionKind::Image,
            "text" => RegionKind::Text,
            "background" => RegionKind::Background,
            other => {
                tracing::warn!(kind = other, "Dropping region of unknown type");
                continue;
            }
        };

        let (x, y) = (normalized(wire.x), normalized(wire.y));
        let (width, height) = (normalized(wire.width), normalized(wire.height));
        let region = match kind {
            RegionKind::Text => {
                NormalizedRegion::text(x, y, width, height, wire.text_content.unwrap_or_default())
            }
            kind => NormalizedRegion::new(kind, x, y, width, height),
        };
        regions.push(region);
    }

    if regions.is_empty() {
        return Err(RecomposeError::collaborator(
            VISION_SERVICE,
            "Vision model returned no usable regions",
        ));
    }

    tracing::debug!(count = regions.len(), "Parsed vision regions");
    Ok(regions)
}

fn normalized(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, NORMALIZED_SCALE as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tagged_regions() {
        let text = r#"{"regions":[
            {"type":"background","x":0,"y":0,"width":1000,"height":1000},
            {"type":"text","x":100,"y":50,"width":300,"height":80,"textContent":"  SALE  "},
            {"type":"image","x":420.6,"y":-5,"width":1200,"height":99.4}
        ]}"#;
        let regions = parse_vision_response(text).unwrap();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0], NormalizedRegion::background());
        assert!(regions[1].is_text());
        assert_eq!(regions[1].text_content, "SALE");
        assert_eq!(
            regions[2],
            NormalizedRegion::new(RegionKind::Image, 421, 0, 1000, 99)
        );
    }

    #[test]
    fn test_unknown_types_are_dropped() {
        let text = r#"{"regions":[
            {"type":"shadow","x":0,"y":0,"width":10,"height":10},
            {"type":"Image","x":0,"y":0,"width":10,"height":10}
        ]}"#;
        let regions = parse_vision_response(text).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::Image);
    }

    #[test]
    fn test_empty_or_malformed_is_collaborator_error() {
        for text in ["", "   ", "not json", r#"{"regions":"x"}"#, r#"{"regions":[]}"#] {
            let err = parse_vision_response(text).unwrap_err();
            assert!(err.is_collaborator(), "{text:?} gave {err}");
        }
    }

    #[test]
    fn test_missing_coordinates_are_malformed() {
        let err = parse_vision_response(r#"{"regions":[{"type":"image","x":1}]}"#).unwrap_err();
        assert!(err.is_collaborator());
    }

    #[test]
    fn test_instructions_mention_cap() {
        assert!(analysis_instructions(7).contains("up to 7 layers"));
    }
}
