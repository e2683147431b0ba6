//! Scale an image's alpha channel.

use std::path::PathBuf;

use recompose_engine::opacity::apply_opacity;
use recompose_engine::Raster;

use super::{load_image, write_image};

pub fn run(image: String, value: f64, output: PathBuf) -> anyhow::Result<()> {
    let raster = Raster::decode(&load_image(&image, None)?)?;
    let faded = apply_opacity(&raster, value).encode_png()?;

    write_image(&output, &faded)?;
    println!("Applied opacity {value} -> {}", output.display());
    Ok(())
}
