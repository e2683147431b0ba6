//! Show image information.

use recompose_engine::Raster;

use super::load_image;

pub fn run(image: String) -> anyhow::Result<()> {
    let encoded = load_image(&image, None)?;
    let raster = Raster::decode(&encoded)?;

    println!("Image: {}", if image.starts_with("data:") { "<data URL>" } else { &image });
    println!("  Media type: {}", encoded.media_type());
    println!("  Size: {}x{}", raster.width(), raster.height());
    println!("  Channels: {}", raster.channels());
    println!("  Encoded bytes: {}", encoded.bytes().len());
    Ok(())
}
