//! Crop an image by a fractional rectangle.

use std::path::PathBuf;

use recompose_engine::crop::crop_encoded;
use recompose_model::geometry::FractionalRect;

use super::{load_image, write_image};

pub fn run(
    image: String,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    output: PathBuf,
) -> anyhow::Result<()> {
    let source = load_image(&image, None)?;
    let rect = FractionalRect::new(left, top, width, height);
    let cropped = crop_encoded(&source, rect)?;

    write_image(&output, &cropped)?;
    println!("Cropped to {}", output.display());
    Ok(())
}
