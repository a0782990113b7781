//! Heightmap buffers and sampling

use std::fmt;

use relief_core::{FormatError, Result};

use crate::bit_depth::expand_samples;

/// Storage precision of a heightmap sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Bytes used by one sample on disk
    pub fn bytes_per_sample(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Largest representable sample value
    pub fn max_value(self) -> f32 {
        match self {
            BitDepth::Eight => u8::MAX as f32,
            BitDepth::Sixteen => u16::MAX as f32,
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Row-major sample storage
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Gray8(Vec<u8>),
    Gray16(Vec<u16>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Gray8(s) => s.len(),
            Samples::Gray16(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single-channel grayscale heightmap.
///
/// The sample count always equals `width * height`; constructors reject
/// anything else instead of truncating or padding.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapBuffer {
    width: u32,
    height: u32,
    samples: Samples,
}

impl HeightmapBuffer {
    /// Wrap 8-bit samples
    pub fn from_gray8(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        check_len(width, height, BitDepth::Eight, samples.len())?;
        Ok(Self {
            width,
            height,
            samples: Samples::Gray8(samples),
        })
    }

    /// Wrap 16-bit samples
    pub fn from_gray16(width: u32, height: u32, samples: Vec<u16>) -> Result<Self> {
        check_len(width, height, BitDepth::Sixteen, samples.len())?;
        Ok(Self {
            width,
            height,
            samples: Samples::Gray16(samples),
        })
    }

    /// Wrap 16-bit samples whose count is already known to match
    pub(crate) fn gray16_unchecked(width: u32, height: u32, samples: Vec<u16>) -> Self {
        debug_assert_eq!(samples.len(), width as usize * height as usize);
        Self {
            width,
            height,
            samples: Samples::Gray16(samples),
        }
    }

    /// A 16-bit heightmap where every sample has the same value
    pub fn filled16(width: u32, height: u32, value: u16) -> Self {
        Self {
            width,
            height,
            samples: Samples::Gray16(vec![value; width as usize * height as usize]),
        }
    }

    /// Build a 16-bit heightmap from normalized [0..1] values, clamping and rounding
    pub fn from_normalized(width: u32, height: u32, values: &[f32]) -> Result<Self> {
        check_len(width, height, BitDepth::Sixteen, values.len())?;
        let samples = values.iter().map(|&v| quantize16(v)).collect();
        Ok(Self {
            width,
            height,
            samples: Samples::Gray16(samples),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self.samples {
            Samples::Gray8(_) => BitDepth::Eight,
            Samples::Gray16(_) => BitDepth::Sixteen,
        }
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Number of samples (`width * height`)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the serialized form in bytes
    pub fn byte_len(&self) -> usize {
        self.len() * self.bit_depth().bytes_per_sample()
    }

    /// 16-bit samples, or `None` for an 8-bit buffer
    pub fn samples16(&self) -> Option<&[u16]> {
        match &self.samples {
            Samples::Gray16(s) => Some(s),
            Samples::Gray8(_) => None,
        }
    }

    pub fn samples16_mut(&mut self) -> Option<&mut [u16]> {
        match &mut self.samples {
            Samples::Gray16(s) => Some(s),
            Samples::Gray8(_) => None,
        }
    }

    /// Require 16-bit storage
    pub fn expect_gray16(&self) -> Result<&[u16]> {
        self.samples16()
            .ok_or_else(|| FormatError::UnexpectedBitDepth(self.bit_depth().bits()).into())
    }

    /// Convert to 16-bit storage. 8-bit samples are expanded by x257.
    pub fn into_gray16(self) -> Self {
        match self.samples {
            Samples::Gray8(s) => Self {
                width: self.width,
                height: self.height,
                samples: Samples::Gray16(expand_samples(&s)),
            },
            Samples::Gray16(_) => self,
        }
    }

    /// Normalized height at a pixel, in [0..1]. `x` and `y` must be in range.
    pub(crate) fn normalized(&self, x: u32, y: u32) -> f32 {
        let i = (y * self.width + x) as usize;
        match &self.samples {
            Samples::Gray8(s) => s[i] as f32 / BitDepth::Eight.max_value(),
            Samples::Gray16(s) => s[i] as f32 / BitDepth::Sixteen.max_value(),
        }
    }

    /// Bilinear sample at continuous pixel coordinates.
    /// Coordinates outside the grid are clamped to the edge samples.
    /// An empty heightmap samples as 0.0.
    pub(crate) fn sample_pixel(&self, fx: f32, fy: f32) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let fx = fx.clamp(0.0, max_x);
        let fy = fy.clamp(0.0, max_y);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let h00 = self.normalized(x0, y0);
        let h10 = self.normalized(x1, y0);
        let h01 = self.normalized(x0, y1);
        let h11 = self.normalized(x1, y1);

        let h0 = h00 * (1.0 - tx) + h10 * tx;
        let h1 = h01 * (1.0 - tx) + h11 * tx;

        h0 * (1.0 - ty) + h1 * ty
    }

    /// Minimum, maximum and mean normalized height
    pub fn stats(&self) -> HeightStats {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;
        for y in 0..self.height {
            for x in 0..self.width {
                let h = self.normalized(x, y);
                min = min.min(h);
                max = max.max(h);
                sum += h as f64;
            }
        }
        let count = self.len().max(1) as f64;
        HeightStats {
            min: if self.is_empty() { 0.0 } else { min },
            max: if self.is_empty() { 0.0 } else { max },
            mean: (sum / count) as f32,
        }
    }
}

/// Summary of a heightmap's normalized value range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Map a normalized height to the full 16-bit range
pub fn quantize16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

pub(crate) fn expected_len(width: u32, height: u32, depth: BitDepth) -> usize {
    width as usize * height as usize * depth.bytes_per_sample()
}

fn check_len(width: u32, height: u32, depth: BitDepth, samples: usize) -> Result<()> {
    let expected = width as usize * height as usize;
    if samples != expected {
        return Err(FormatError::SizeMismatch {
            path: None,
            width,
            height,
            bit_depth: depth.bits(),
            expected: expected * depth.bytes_per_sample(),
            actual: samples * depth.bytes_per_sample(),
        }
        .into());
    }
    Ok(())
}
