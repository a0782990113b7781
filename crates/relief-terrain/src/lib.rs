//! Relief Terrain - Heightmap buffers and format conversion
//!
//! Provides the raw heightmap codec, 8-bit to 16-bit expansion, and the
//! legacy-to-current grid resampler. Does not depend on the blur pipeline;
//! everything here is synchronous and side-effect free apart from file IO.

pub mod bit_depth;
pub mod codec;
pub mod heightmap;
pub mod host;
pub mod resample;

pub use bit_depth::{expand_8_to_16, expand_samples};
pub use codec::{decode, detect_raw_depth, encode, grayscale16, load_image, read_raw, write_raw};
pub use heightmap::{quantize16, BitDepth, HeightStats, HeightmapBuffer, Samples};
pub use host::{MemoryTerrain, TerrainHost};
pub use resample::{
    apply_elevation_offset, is_legacy_grid, resample, resample_to, scale_factor, GridSpec,
    CURRENT_GRID, DEFAULT_ELEVATION_OFFSET, LEGACY_GRID,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_reject_wrong_sample_counts() {
        assert!(HeightmapBuffer::from_gray8(3, 3, vec![0; 8]).is_err());
        assert!(HeightmapBuffer::from_gray16(3, 3, vec![0; 10]).is_err());
        assert!(HeightmapBuffer::from_normalized(2, 2, &[0.0; 3]).is_err());
    }

    #[test]
    fn into_gray16_expands_8bit() {
        let hm = HeightmapBuffer::from_gray8(2, 1, vec![128, 255]).unwrap();
        let hm16 = hm.into_gray16();
        assert_eq!(hm16.bit_depth(), BitDepth::Sixteen);
        assert_eq!(hm16.samples16().unwrap(), &[32896, 65535]);
    }

    #[test]
    fn height_sampling_returns_correct_values() {
        // 3x3 heightmap: center pixel is 1.0, edges are 0.0
        let heights = vec![
            0.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let hm = HeightmapBuffer::from_normalized(3, 3, &heights).unwrap();

        // Center pixel should be 1.0
        let center = hm.sample_pixel(1.0, 1.0);
        assert!((center - 1.0).abs() < 0.01);

        // Corner should be 0.0
        let corner = hm.sample_pixel(0.0, 0.0);
        assert!((corner - 0.0).abs() < 0.01);

        // Halfway between corner and center
        let mid = hm.sample_pixel(0.5, 1.0);
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn empty_heightmap_samples_without_panicking() {
        let hm = HeightmapBuffer::from_gray16(0, 0, vec![]).unwrap();
        assert!(hm.is_empty());
        assert_eq!(hm.sample_pixel(0.5, 0.5), 0.0);
        assert_eq!(hm.sample_pixel(3.0, -1.0), 0.0);

        let stats = hm.stats();
        assert_eq!((stats.min, stats.max, stats.mean), (0.0, 0.0, 0.0));

        let column = HeightmapBuffer::from_gray16(0, 5, vec![]).unwrap();
        assert_eq!(column.sample_pixel(0.0, 2.0), 0.0);
    }

    #[test]
    fn stats_cover_range() {
        let hm = HeightmapBuffer::from_gray16(2, 2, vec![0, 65535, 65535, 0]).unwrap();
        let stats = hm.stats();
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert!((stats.mean - 0.5).abs() < 1e-6);
    }

    #[test]
    fn memory_terrain_roundtrips_through_host_trait() {
        let mut terrain = MemoryTerrain::flat(4, 1000);
        let snapshot = terrain.heightmap().unwrap();
        assert_eq!((snapshot.width(), snapshot.height()), (4, 4));

        let exported = grayscale16(&snapshot);
        assert!(exported.samples16().unwrap().iter().all(|&v| v == 1000));

        terrain
            .replace_heightmap(HeightmapBuffer::filled16(8, 8, 2000))
            .unwrap();
        assert_eq!(terrain.replacements, 1);
        assert_eq!(terrain.buffer().width(), 8);
    }

    #[test]
    fn memory_terrain_refuses_8bit_replacement() {
        let mut terrain = MemoryTerrain::flat(2, 0);
        let hm8 = HeightmapBuffer::from_gray8(2, 2, vec![1; 4]).unwrap();
        assert!(terrain.replace_heightmap(hm8).is_err());
        assert_eq!(terrain.replacements, 0);
    }
}
