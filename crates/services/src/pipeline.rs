//! Collaborator-driven pipelines.

use recompose_common::config::CompositionDefaults;
use recompose_common::error::RecomposeResult;
use recompose_engine::{Raster, RegionExtractor};
use recompose_model::layer::Layer;
use recompose_model::transport::EncodedRaster;

use crate::vision::{parse_vision_response, VisionAnalyzer};

/// Split `source` into layers using the vision collaborator.
///
/// The source is decoded before the collaborator is called, so a bad
/// source never costs a round trip. Layers come back in region order.
pub async fn extract_layers(
    analyzer: &dyn VisionAnalyzer,
    source: &EncodedRaster,
    config: &CompositionDefaults,
) -> RecomposeResult<Vec<Layer>> {
    let raster = Raster::decode(source)?;
    let extractor = RegionExtractor::from_config(config);

    let response = analyzer.analyze(source, extractor.max_regions()).await?;
    let regions = parse_vision_response(&response)?;
    let layers = extractor.extract(&raster, &regions)?;

    tracing::info!(
        regions = regions.len(),
        layers = layers.len(),
        width = raster.width(),
        height = raster.height(),
        "Extracted layers"
    );
    Ok(layers)
}
