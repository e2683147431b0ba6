//! Compose a base image and its layers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use recompose_common::config::AppConfig;
use recompose_engine::{compose_with_budget, CompositionEngine};
use recompose_model::layer::{CompositionRequest, Layer};
use serde::Deserialize;

use super::{load_image, write_image};

/// On-disk request: rasters may be data URLs or paths relative to the file.
#[derive(Deserialize)]
struct RequestFile {
    base: String,
    #[serde(default)]
    layers: Vec<serde_json::Value>,
}

pub async fn run(request: PathBuf, output: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    println!("Composing request: {}", request.display());

    let text = std::fs::read_to_string(&request)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", request.display()))?;
    let file: RequestFile = serde_json::from_str(&text)?;
    let base_dir = request.parent();

    let base = load_image(&file.base, base_dir)?;
    let mut layers = Vec::with_capacity(file.layers.len());
    for mut value in file.layers {
        for key in ["raster", "original_raster"] {
            if let Some(serde_json::Value::String(source)) = value.get(key) {
                let resolved = load_image(source, base_dir)?.to_data_url();
                value[key] = serde_json::Value::String(resolved);
            }
        }
        layers.push(serde_json::from_value::<Layer>(value)?);
    }

    let engine = Arc::new(CompositionEngine::new(&config.composition));
    let budget = Duration::from_millis(config.composition.timeout_ms);
    tracing::debug!(
        layers = layers.len(),
        budget_ms = config.composition.timeout_ms,
        "Submitting composition"
    );
    let result = compose_with_budget(engine, CompositionRequest { base, layers }, budget).await?;

    write_image(&output, &result.raster)?;

    println!("  Output: {}", output.display());
    println!("  Size: {}x{}", result.width, result.height);
    println!("  Layers drawn: {}", result.placed.len());
    for skipped in &result.skipped {
        println!("  Skipped {}: {:?}", skipped.id, skipped.reason);
    }

    Ok(())
}
