//! 16-bit raw export of an image heightmap

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relief_convert::{default_export_path, export_heightmap};
use relief_terrain::{load_image, MemoryTerrain};

pub fn run(image: &str, name: &str, output: Option<&str>) -> Result<()> {
    let source = Path::new(image);
    let heightmap =
        load_image(source).with_context(|| format!("Failed to load image '{}'", image))?;
    let host = MemoryTerrain::new(heightmap);

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => default_export_path(name),
    };

    let exported = export_heightmap(&host, &path)
        .with_context(|| format!("Failed to export heightmap to '{}'", path.display()))?;

    println!(
        "Exported {}x{} 16-bit heightmap to {}",
        exported.width(),
        exported.height(),
        path.display()
    );
    Ok(())
}
