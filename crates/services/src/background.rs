//! Background-removal collaborator.

use async_trait::async_trait;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_engine::Raster;
use recompose_model::layer::Layer;
use recompose_model::transport::EncodedRaster;

/// Service name used in collaborator errors.
pub const BACKGROUND_SERVICE: &str = "background-removal";

/// Makes the background pixels of an image transparent.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: &EncodedRaster) -> RecomposeResult<EncodedRaster>;
}

/// Strip the background from a layer's pixels in place.
///
/// The pixels the layer had before its first edit stay in
/// [`Layer::original_raster`] so the edit can be undone with
/// [`Layer::reset_raster`]. On failure the layer is left untouched.
pub async fn remove_layer_background(
    remover: &dyn BackgroundRemover,
    layer: &mut Layer,
) -> RecomposeResult<()> {
    let current = layer.raster.as_ref().ok_or_else(|| {
        RecomposeError::validation(format!("layer {} has no raster to edit", layer.id))
    })?;

    let output = remover.remove_background(current).await?;
    let decoded = Raster::decode(&output).map_err(|e| {
        RecomposeError::collaborator(BACKGROUND_SERVICE, format!("unusable output: {e}"))
    })?;

    tracing::info!(
        layer = %layer.id,
        width = decoded.width(),
        height = decoded.height(),
        "Background removed"
    );
    layer.replace_raster(decoded.encode_png()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use recompose_model::geometry::Rectangle;

    /// Clears every pixel whose red channel is 255.
    struct KeyOutRed;

    #[async_trait]
    impl BackgroundRemover for KeyOutRed {
        async fn remove_background(&self, image: &EncodedRaster) -> RecomposeResult<EncodedRaster> {
            let mut pixels = Raster::decode(image)?.to_rgba();
            for p in pixels.pixels_mut() {
                if p[0] == 255 {
                    p[3] = 0;
                }
            }
            Raster::from_rgba(pixels).encode_png()
        }
    }

    struct Broken;

    #[async_trait]
    impl BackgroundRemover for Broken {
        async fn remove_background(&self, _: &EncodedRaster) -> RecomposeResult<EncodedRaster> {
            Ok(EncodedRaster::png(b"garbage".to_vec()))
        }
    }

    fn layer() -> Layer {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 255, 255]));
        let raster = Raster::from_rgba(img).encode_png().unwrap();
        Layer::with_raster(Rectangle::new(0, 0, 4, 4), raster)
    }

    #[tokio::test]
    async fn test_replaces_raster_and_keeps_original() {
        let mut layer = layer();
        let before = layer.raster.clone();

        remove_layer_background(&KeyOutRed, &mut layer).await.unwrap();
        let after = Raster::decode(layer.raster.as_ref().unwrap()).unwrap();
        assert_eq!(after.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(after.pixel(1, 1), Some([0, 0, 255, 255]));
        assert_eq!(layer.original_raster, before);

        layer.reset_raster();
        assert_eq!(layer.raster, before);
    }

    #[tokio::test]
    async fn test_second_edit_keeps_first_original() {
        let mut layer = layer();
        let before = layer.raster.clone();
        remove_layer_background(&KeyOutRed, &mut layer).await.unwrap();
        remove_layer_background(&KeyOutRed, &mut layer).await.unwrap();
        assert_eq!(layer.original_raster, before);
    }

    #[tokio::test]
    async fn test_unusable_output_leaves_layer_untouched() {
        let mut layer = layer();
        let before = layer.clone();
        let err = remove_layer_background(&Broken, &mut layer).await.unwrap_err();
        assert!(err.is_collaborator());
        assert_eq!(layer, before);
    }

    #[tokio::test]
    async fn test_text_layer_is_rejected() {
        let mut layer = Layer::text(Rectangle::new(0, 0, 4, 4), "hi");
        let err = remove_layer_background(&KeyOutRed, &mut layer).await.unwrap_err();
        assert!(err.is_validation());
    }
}
