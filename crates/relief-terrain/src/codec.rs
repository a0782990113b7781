//! Raw heightmap codec and image loading
//!
//! Raw files carry no header: 8-bit files hold `width * height` bytes,
//! 16-bit files hold `width * height * 2` bytes in little-endian order.
//! Both are row-major with a top-left origin.

use std::path::Path;

use image::DynamicImage;
use relief_core::{FormatError, ReliefError, Result};

use crate::heightmap::{expected_len, quantize16, BitDepth, HeightmapBuffer, Samples};

/// Decode raw bytes into a heightmap of the declared size
pub fn decode(bytes: &[u8], width: u32, height: u32, bit_depth: BitDepth) -> Result<HeightmapBuffer> {
    let expected = expected_len(width, height, bit_depth);
    if bytes.len() != expected {
        return Err(FormatError::SizeMismatch {
            path: None,
            width,
            height,
            bit_depth: bit_depth.bits(),
            expected,
            actual: bytes.len(),
        }
        .into());
    }

    match bit_depth {
        BitDepth::Eight => HeightmapBuffer::from_gray8(width, height, bytes.to_vec()),
        BitDepth::Sixteen => {
            let samples = bytes
                .chunks_exact(2)
                .map(|p| u16::from_le_bytes([p[0], p[1]]))
                .collect();
            HeightmapBuffer::from_gray16(width, height, samples)
        }
    }
}

/// Serialize a heightmap at its own bit depth
pub fn encode(buffer: &HeightmapBuffer) -> Vec<u8> {
    match buffer.samples() {
        Samples::Gray8(s) => s.clone(),
        Samples::Gray16(s) => {
            let mut out = Vec::with_capacity(s.len() * 2);
            for v in s {
                out.extend_from_slice(&v.to_le_bytes());
            }
            out
        }
    }
}

/// Infer a raw file's bit depth from its length
pub fn detect_raw_depth(len: usize, width: u32, height: u32) -> Option<BitDepth> {
    if len == expected_len(width, height, BitDepth::Eight) {
        Some(BitDepth::Eight)
    } else if len == expected_len(width, height, BitDepth::Sixteen) {
        Some(BitDepth::Sixteen)
    } else {
        None
    }
}

/// Read and decode a raw heightmap file
pub fn read_raw(path: &Path, width: u32, height: u32, bit_depth: BitDepth) -> Result<HeightmapBuffer> {
    let bytes = std::fs::read(path).map_err(|e| ReliefError::io(path, e))?;
    decode(&bytes, width, height, bit_depth).map_err(|e| attach_path(e, path))
}

/// Encode and write a raw heightmap file
pub fn write_raw(path: &Path, buffer: &HeightmapBuffer) -> Result<()> {
    std::fs::write(path, encode(buffer)).map_err(|e| ReliefError::io(path, e))?;
    log::info!(
        "Heightmap exported to {} ({}x{}, {})",
        path.display(),
        buffer.width(),
        buffer.height(),
        buffer.bit_depth()
    );
    Ok(())
}

/// Reduce an image to a 16-bit grayscale heightmap.
///
/// Each sample is the unweighted mean of the pixel's color channels (alpha
/// is ignored), scaled to the full 16-bit range and rounded. 16-bit
/// single-channel images pass through unchanged.
pub fn grayscale16(image: &DynamicImage) -> HeightmapBuffer {
    let (width, height) = (image.width(), image.height());

    if let DynamicImage::ImageLuma16(gray) = image {
        return HeightmapBuffer::gray16_unchecked(width, height, gray.as_raw().clone());
    }

    let rgb = image.to_rgb32f();
    let values: Vec<u16> = rgb
        .pixels()
        .map(|p| quantize16((p.0[0] + p.0[1] + p.0[2]) / 3.0))
        .collect();
    HeightmapBuffer::gray16_unchecked(width, height, values)
}

/// Load a `.png` / `.tiff` heightmap as 16-bit grayscale
pub fn load_image(path: &Path) -> Result<HeightmapBuffer> {
    let image = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => ReliefError::io(path, io),
        other => FormatError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        }
        .into(),
    })?;

    log::info!(
        "Loaded image heightmap {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );

    Ok(grayscale16(&image))
}

fn attach_path(err: ReliefError, path: &Path) -> ReliefError {
    match err {
        ReliefError::Format(f) => ReliefError::Format(f.with_path(path)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("relief_codec_test_{}.{}", uuid::Uuid::new_v4(), ext))
    }

    #[test]
    fn decode_16bit_is_little_endian() {
        let bytes = [0x34, 0x12, 0xFF, 0xFF];
        let hm = decode(&bytes, 2, 1, BitDepth::Sixteen).unwrap();
        assert_eq!(hm.samples16().unwrap(), &[0x1234, 0xFFFF]);
    }

    #[test]
    fn decode_rejects_one_byte_short() {
        for depth in [BitDepth::Eight, BitDepth::Sixteen] {
            let len = 4 * 3 * depth.bytes_per_sample() - 1;
            let result = decode(&vec![0u8; len], 4, 3, depth);
            match result {
                Err(ReliefError::Format(FormatError::SizeMismatch { expected, actual, .. })) => {
                    assert_eq!(expected, len + 1);
                    assert_eq!(actual, len);
                }
                other => panic!("expected SizeMismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn decode_rejects_oversized_input() {
        assert!(decode(&[0u8; 5], 2, 2, BitDepth::Eight).is_err());
    }

    #[test]
    fn encode_decode_keeps_dimensions_and_values() {
        let hm = HeightmapBuffer::from_gray16(3, 2, vec![0, 1, 256, 32896, 65534, 65535]).unwrap();
        let bytes = encode(&hm);
        assert_eq!(bytes.len(), hm.byte_len());

        let back = decode(&bytes, 3, 2, BitDepth::Sixteen).unwrap();
        assert_eq!(back.width(), 3);
        assert_eq!(back.height(), 2);
        assert_eq!(back, hm);

        let hm8 = HeightmapBuffer::from_gray8(2, 2, vec![0, 9, 128, 255]).unwrap();
        assert_eq!(decode(&encode(&hm8), 2, 2, BitDepth::Eight).unwrap(), hm8);
    }

    #[test]
    fn detect_depth_by_length() {
        assert_eq!(detect_raw_depth(16, 4, 4), Some(BitDepth::Eight));
        assert_eq!(detect_raw_depth(32, 4, 4), Some(BitDepth::Sixteen));
        assert_eq!(detect_raw_depth(31, 4, 4), None);
    }

    #[test]
    fn grayscale_averages_color_channels() {
        let img: RgbImage = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let hm = grayscale16(&DynamicImage::ImageRgb8(img));
        let s = hm.samples16().unwrap();
        // (1 + 0 + 0) / 3 * 65535 = 21845
        assert_eq!(s[0], 21845);
        assert_eq!(s[1], 65535);
    }

    #[test]
    fn grayscale_ignores_alpha() {
        let img: RgbaImage = ImageBuffer::from_pixel(1, 1, Rgba([51, 51, 51, 0]));
        let hm = grayscale16(&DynamicImage::ImageRgba8(img));
        assert_eq!(hm.samples16().unwrap()[0], 51 * 257);
    }

    #[test]
    fn grayscale_passes_single_channel_through() {
        let img16: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![12345, 54321]).unwrap();
        let hm = grayscale16(&DynamicImage::ImageLuma16(img16));
        assert_eq!(hm.samples16().unwrap(), &[12345, 54321]);

        let img8: GrayImage = ImageBuffer::from_raw(2, 1, vec![128, 255]).unwrap();
        let hm = grayscale16(&DynamicImage::ImageLuma8(img8));
        assert_eq!(hm.samples16().unwrap(), &[128 * 257, 65535]);
    }

    #[test]
    fn read_raw_reports_path_on_mismatch() {
        let path = temp_path("raw");
        std::fs::write(&path, [0u8; 7]).unwrap();

        let err = read_raw(&path, 2, 2, BitDepth::Sixteen).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn read_raw_missing_file_is_io_error() {
        let path = temp_path("raw");
        let err = read_raw(&path, 2, 2, BitDepth::Eight).unwrap_err();
        assert!(matches!(err, ReliefError::Io { .. }));
    }

    #[test]
    fn write_then_read_raw() {
        let path = temp_path("raw");
        let hm = HeightmapBuffer::from_gray16(2, 2, vec![1, 2, 3, 4]).unwrap();
        write_raw(&path, &hm).unwrap();

        let back = read_raw(&path, 2, 2, BitDepth::Sixteen).unwrap();
        assert_eq!(back, hm);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_png_heightmap() {
        let path = temp_path("png");
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 2, vec![0, 1000, 30000, 65535]).unwrap();
        img.save(&path).unwrap();

        let hm = load_image(&path).unwrap();
        assert_eq!((hm.width(), hm.height()), (2, 2));
        assert_eq!(hm.samples16().unwrap(), &[0, 1000, 30000, 65535]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_garbage_image_is_decode_error() {
        let path = temp_path("png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, ReliefError::Format(FormatError::Decode { .. })));

        std::fs::remove_file(&path).ok();
    }
}
