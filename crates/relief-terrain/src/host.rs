//! The terrain object whose heightmap gets replaced

use image::{DynamicImage, ImageBuffer, Luma};
use relief_core::{ReliefError, Result};

use crate::heightmap::HeightmapBuffer;

/// A terrain owner that can hand out and accept heightmaps.
///
/// Only dimensions and pixel values cross this boundary; the host's internal
/// representation stays opaque.
pub trait TerrainHost {
    /// Snapshot of the current heightmap
    fn heightmap(&self) -> Result<DynamicImage>;

    /// Replace the current heightmap with a finished 16-bit buffer
    fn replace_heightmap(&mut self, heightmap: HeightmapBuffer) -> Result<()>;
}

/// In-memory terrain that stores a 16-bit heightmap
pub struct MemoryTerrain {
    heightmap: HeightmapBuffer,
    /// Number of times the heightmap has been replaced
    pub replacements: u32,
}

impl MemoryTerrain {
    pub fn new(heightmap: HeightmapBuffer) -> Self {
        Self {
            heightmap: heightmap.into_gray16(),
            replacements: 0,
        }
    }

    /// A flat terrain at the given 16-bit height
    pub fn flat(side: u32, value: u16) -> Self {
        Self::new(HeightmapBuffer::filled16(side, side, value))
    }

    pub fn buffer(&self) -> &HeightmapBuffer {
        &self.heightmap
    }
}

impl TerrainHost for MemoryTerrain {
    fn heightmap(&self) -> Result<DynamicImage> {
        let samples = self.heightmap.expect_gray16()?.to_vec();
        let image: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(self.heightmap.width(), self.heightmap.height(), samples)
                .ok_or_else(|| {
                    ReliefError::InvalidState("heightmap does not fit its dimensions".to_string())
                })?;
        Ok(DynamicImage::ImageLuma16(image))
    }

    fn replace_heightmap(&mut self, heightmap: HeightmapBuffer) -> Result<()> {
        heightmap.expect_gray16()?;
        log::info!(
            "Replacing terrain heightmap ({}x{} -> {}x{})",
            self.heightmap.width(),
            self.heightmap.height(),
            heightmap.width(),
            heightmap.height()
        );
        self.heightmap = heightmap;
        self.replacements += 1;
        Ok(())
    }
}
