//! Split an image into layers from a region list.

use std::path::PathBuf;

use recompose_common::config::AppConfig;
use recompose_engine::{Raster, RegionExtractor};
use recompose_model::geometry::Rectangle;
use recompose_model::layer::{LayerId, LayerKind, LayerStack};
use recompose_services::parse_vision_response;
use serde::Serialize;

use super::{load_image, write_image};

#[derive(Serialize)]
struct ManifestEntry {
    id: LayerId,
    kind: LayerKind,
    rectangle: Rectangle,
    #[serde(skip_serializing_if = "String::is_empty")]
    text_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
}

pub fn run(
    image: String,
    regions: PathBuf,
    output: PathBuf,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let source = Raster::decode(&load_image(&image, None)?)?;
    let response = std::fs::read_to_string(&regions)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", regions.display()))?;
    let regions = parse_vision_response(&response)?;
    tracing::debug!(regions = regions.len(), "Loaded region list");

    let extractor = RegionExtractor::from_config(&config.composition);
    let mut stack = LayerStack::new();
    stack.extend(extractor.extract(&source, &regions)?);

    std::fs::create_dir_all(&output)?;
    let mut manifest = Vec::with_capacity(stack.len());
    for layer in stack.iter() {
        let file = match &layer.raster {
            Some(raster) => {
                let name = format!("{}.png", layer.id);
                write_image(&output.join(&name), raster)?;
                Some(name)
            }
            None => None,
        };
        manifest.push(ManifestEntry {
            id: layer.id,
            kind: layer.kind,
            rectangle: layer.rectangle,
            text_content: layer.text_content.clone(),
            file,
        });
    }

    let manifest_path = output.join("layers.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

    println!("Extracted {} layer(s) into {}", stack.len(), output.display());
    for entry in &manifest {
        let r = entry.rectangle;
        println!(
            "  {} {:?} at {},{} {}x{}",
            entry.id, entry.kind, r.x, r.y, r.width, r.height
        );
    }
    Ok(())
}
