//! Legacy-to-current terrain grid conversion
//!
//! The legacy and current grids cover different ground areas at different
//! sample densities. Resampling keeps the real-world horizontal scale: each
//! legacy pixel is stretched to cover the same ground as before, then the
//! top-left corner of the stretched grid is cropped to the current size.

use relief_core::{ReliefError, Result};

use crate::heightmap::{quantize16, HeightmapBuffer};

/// A square terrain grid convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Side length in samples
    pub side: u32,
    /// Ground area covered by the whole grid
    pub coverage_area: f64,
}

impl GridSpec {
    /// Ground area covered by a single sample
    pub fn pixel_area(&self) -> f64 {
        self.coverage_area / (self.side as f64 * self.side as f64)
    }
}

/// The older 1081x1081 terrain convention
pub const LEGACY_GRID: GridSpec = GridSpec {
    side: 1081,
    coverage_area: 298.5984,
};

/// The current 4096x4096 terrain convention
pub const CURRENT_GRID: GridSpec = GridSpec {
    side: 4096,
    coverage_area: 205.52,
};

/// Height added to legacy maps so their sea level lines up with the current grid
pub const DEFAULT_ELEVATION_OFFSET: f32 = 0.058;

/// Linear scale that maps legacy samples onto current samples of equal ground size
pub fn scale_factor(legacy: &GridSpec, current: &GridSpec) -> f64 {
    (legacy.pixel_area() / current.pixel_area()).sqrt()
}

/// True when a heightmap has the legacy grid dimensions
pub fn is_legacy_grid(width: u32, height: u32) -> bool {
    width == LEGACY_GRID.side && height == LEGACY_GRID.side
}

/// Offset a normalized height and clamp it back into [0..1]
pub fn apply_elevation_offset(value: f32, offset: f32) -> f32 {
    (value + offset).clamp(0.0, 1.0)
}

/// Convert a legacy heightmap to the current grid
pub fn resample(source: &HeightmapBuffer, elevation_offset: f32) -> Result<HeightmapBuffer> {
    resample_to(source, elevation_offset, &LEGACY_GRID, &CURRENT_GRID)
}

/// Rescale `source` by the ratio between two grids, crop the top-left
/// `current.side` square and apply the elevation offset.
///
/// A rescaled grid that rounds to one sample short of the target is edge
/// clamped. Anything smaller would need a padding policy and is rejected.
pub fn resample_to(
    source: &HeightmapBuffer,
    elevation_offset: f32,
    legacy: &GridSpec,
    current: &GridSpec,
) -> Result<HeightmapBuffer> {
    if source.is_empty() {
        return Err(ReliefError::InvalidState(
            "cannot resample an empty heightmap".to_string(),
        ));
    }

    let scale = scale_factor(legacy, current);
    let target = current.side;
    let scaled_w = (source.width() as f64 * scale).round() as u32;
    let scaled_h = (source.height() as f64 * scale).round() as u32;

    let shortest = scaled_w.min(scaled_h);
    if shortest + 1 < target {
        return Err(ReliefError::ResampleUnderflow {
            scaled: shortest,
            target,
        });
    }

    log::info!(
        "Resampling {}x{} by {:.5} to {}x{}, cropping to {}x{}",
        source.width(),
        source.height(),
        scale,
        scaled_w,
        scaled_h,
        target,
        target
    );

    // Pixel-center mapping from the scaled grid back into the source grid
    let step_x = source.width() as f32 / scaled_w as f32;
    let step_y = source.height() as f32 / scaled_h as f32;

    let mut samples = Vec::with_capacity(target as usize * target as usize);
    for y in 0..target {
        let sy = (y as f32 + 0.5) * step_y - 0.5;
        for x in 0..target {
            let sx = (x as f32 + 0.5) * step_x - 0.5;
            let h = source.sample_pixel(sx, sy);
            samples.push(quantize16(apply_elevation_offset(h, elevation_offset)));
        }
    }

    HeightmapBuffer::from_gray16(target, target, samples)
}
