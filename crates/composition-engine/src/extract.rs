//! Region extraction: turn vision regions into independent layers.

use recompose_common::config::CompositionDefaults;
use recompose_common::error::RecomposeResult;
use recompose_model::geometry::NormalizedRegion;
use recompose_model::layer::Layer;
use recompose_model::transport::EncodedRaster;

use crate::coords::map_region;
use crate::raster::Raster;

/// Default cap on regions turned into layers.
pub const MAX_REGIONS: usize = 12;

/// Crops vision-reported regions out of a source raster.
#[derive(Debug, Clone)]
pub struct RegionExtractor {
    max_regions: usize,
}

impl RegionExtractor {
    pub fn new(max_regions: usize) -> Self {
        Self { max_regions }
    }

    pub fn with_defaults() -> Self {
        Self::new(MAX_REGIONS)
    }

    pub fn from_config(config: &CompositionDefaults) -> Self {
        Self::new(config.max_regions)
    }

    pub fn max_regions(&self) -> usize {
        self.max_regions
    }

    /// Decode `source` and extract layers from it.
    pub fn extract_encoded(
        &self,
        source: &EncodedRaster,
        regions: &[NormalizedRegion],
    ) -> RecomposeResult<Vec<Layer>> {
        let source = Raster::decode(source)?;
        self.extract(&source, regions)
    }

    /// Produce one layer per retained region, in input order.
    ///
    /// Regions past the cap are dropped. Text regions become raster-less
    /// text layers; every other region gets a crop of the source placed at
    /// its mapped rectangle.
    pub fn extract(
        &self,
        source: &Raster,
        regions: &[NormalizedRegion],
    ) -> RecomposeResult<Vec<Layer>> {
        if regions.len() > self.max_regions {
            tracing::debug!(
                received = regions.len(),
                kept = self.max_regions,
                "Dropping regions past the extraction cap"
            );
        }

        let (width, height) = source.dimensions();
        let mut layers = Vec::with_capacity(regions.len().min(self.max_regions));

        for region in regions.iter().take(self.max_regions) {
            let rect = map_region(region, width, height);

            if region.is_text() {
                layers.push(Layer::text(rect, region.text_content.trim()));
                continue;
            }

            let layer = match source.crop(rect) {
                Some(crop) => Layer::with_raster(rect, crop.encode_png()?),
                None => {
                    tracing::debug!(?rect, "Region clipped to nothing; layer has no raster");
                    Layer::empty(rect)
                }
            };
            layers.push(layer);
        }

        Ok(layers)
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}
