//! Render a solid colour background.

use std::path::PathBuf;

use recompose_engine::solid::solid_background;

use super::write_image;

pub fn run(color: String, width: f64, height: f64, output: PathBuf) -> anyhow::Result<()> {
    let raster = solid_background(&color, width, height);
    write_image(&output, &raster.encode_png()?)?;

    println!(
        "Solid {color} background {}x{} -> {}",
        raster.width(),
        raster.height(),
        output.display()
    );
    Ok(())
}
