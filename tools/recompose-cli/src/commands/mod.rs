pub mod compose;
pub mod crop;
pub mod extract;
pub mod info;
pub mod opacity;
pub mod snapshots;
pub mod solid;

use std::path::Path;

use recompose_model::transport::EncodedRaster;

/// Load an image from a file path or a `data:` URL.
///
/// Relative paths are resolved against `base_dir` when given.
pub fn load_image(source: &str, base_dir: Option<&Path>) -> anyhow::Result<EncodedRaster> {
    if source.starts_with("data:") {
        return EncodedRaster::parse(source).map_err(|e| anyhow::anyhow!("Invalid data URL: {e}"));
    }

    let path = match base_dir {
        Some(dir) if Path::new(source).is_relative() => dir.join(source),
        _ => Path::new(source).to_path_buf(),
    };
    let bytes = std::fs::read(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let format = image::guess_format(&bytes)
        .map_err(|e| anyhow::anyhow!("Unrecognized image {}: {e}", path.display()))?;

    Ok(EncodedRaster::from_bytes(format.to_mime_type(), bytes))
}

/// Write encoded bytes, creating parent directories.
pub fn write_image(path: &Path, raster: &EncodedRaster) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, raster.bytes())
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))
}
