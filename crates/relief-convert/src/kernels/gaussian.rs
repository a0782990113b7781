//! CPU gaussian blur kernel
//!
//! Separable gaussian run on the rayon pool. The result is blended with the
//! input by `intensity`, so 0.0 leaves the heightmap untouched and 1.0 is a
//! full blur. Edges are clamped.

use rayon::prelude::*;
use relief_core::{ReliefError, Result};
use relief_terrain::HeightmapBuffer;

use crate::kernel::{fence, BlurKernel, KernelBinding, KernelFence, KernelStatus};

/// Default blur radius in samples
pub const DEFAULT_RADIUS: u32 = 2;

/// Gaussian blur backed by rayon worker threads
pub struct GaussianKernel {
    radius: u32,
    weights: Vec<f32>,
}

impl GaussianKernel {
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            weights: gaussian_weights(radius),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl BlurKernel for GaussianKernel {
    fn name(&self) -> &str {
        "gaussian"
    }

    fn status(&self) -> KernelStatus {
        KernelStatus::Available
    }

    fn dispatch(&self, mut binding: KernelBinding) -> Result<KernelFence> {
        let (signal, fence) = fence();
        let weights = self.weights.clone();

        rayon::spawn(move || {
            let result = blur_into(
                &binding.input,
                &mut binding.output,
                &weights,
                binding.intensity,
            )
            .map(|()| binding.into_output());
            signal.signal(result);
        });

        Ok(fence)
    }
}

/// Normalized 1D gaussian weights for `radius` samples on each side
pub fn gaussian_weights(radius: u32) -> Vec<f32> {
    let sigma = (radius as f32 / 2.0).max(0.5);
    let r = radius as i32;
    let mut weights: Vec<f32> = (-r..=r)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

fn blur_into(
    input: &HeightmapBuffer,
    output: &mut HeightmapBuffer,
    weights: &[f32],
    intensity: f32,
) -> Result<()> {
    let width = input.width() as usize;
    let height = input.height() as usize;
    if width == 0 || height == 0 {
        return Ok(());
    }

    let src = input.expect_gray16()?;
    let radius = (weights.len() / 2) as isize;

    // Horizontal pass
    let mut temp = vec![0.0f32; width * height];
    temp.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * width..(y + 1) * width];
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, w) in weights.iter().enumerate() {
                let sx = (x as isize + k as isize - radius).clamp(0, width as isize - 1) as usize;
                acc += w * src_row[sx] as f32;
            }
            *out = acc;
        }
    });

    // Vertical pass, blended with the original by intensity
    let dst = output
        .samples16_mut()
        .ok_or_else(|| ReliefError::KernelError("output binding is not 16-bit".to_string()))?;
    dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, w) in weights.iter().enumerate() {
                let sy = (y as isize + k as isize - radius).clamp(0, height as isize - 1) as usize;
                acc += w * temp[sy * width + x];
            }
            let original = src[y * width + x] as f32;
            let blended = original + (acc - original) * intensity;
            *out = blended.round().clamp(0.0, u16::MAX as f32) as u16;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run(kernel: &GaussianKernel, input: HeightmapBuffer, intensity: f32) -> HeightmapBuffer {
        let output = HeightmapBuffer::filled16(input.width(), input.height(), 0);
        let binding = KernelBinding::new(input, output, intensity).unwrap();
        kernel.dispatch(binding).unwrap().wait().unwrap().output
    }

    #[test]
    fn weights_are_normalized_and_symmetric() {
        let w = gaussian_weights(3);
        assert_eq!(w.len(), 7);
        assert_relative_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(w[0], w[6]);
        assert!(w[3] > w[2]);
    }

    #[test]
    fn uniform_field_stays_uniform() {
        let kernel = GaussianKernel::default();
        for value in [0u16, 32896, 65535] {
            let out = run(&kernel, HeightmapBuffer::filled16(9, 7, value), 1.0);
            assert!(out.samples16().unwrap().iter().all(|&v| v == value));
        }
    }

    #[test]
    fn spike_spreads_to_neighbours() {
        let mut samples = vec![0u16; 25];
        samples[12] = 60000;
        let input = HeightmapBuffer::from_gray16(5, 5, samples).unwrap();
        let out = run(&GaussianKernel::new(1), input, 1.0);
        let s = out.samples16().unwrap();

        assert!(s[12] < 60000);
        assert!(s[11] > 0 && s[13] > 0 && s[7] > 0 && s[17] > 0);
        assert_eq!(s[11], s[13]);
        assert_eq!(s[7], s[17]);
    }

    #[test]
    fn zero_intensity_is_identity() {
        let input = HeightmapBuffer::from_gray16(3, 1, vec![0, 50000, 10]).unwrap();
        let out = run(&GaussianKernel::default(), input.clone(), 0.0);
        assert_eq!(out.samples16(), input.samples16());
    }

    #[test]
    fn softens_terrace_steps() {
        // 8-bit steps expanded to 16-bit leave 257-wide terraces
        let row: Vec<u16> = (0..16).map(|x| (x / 4) * 257).collect();
        let input = HeightmapBuffer::from_gray16(16, 1, row).unwrap();
        let out = run(&GaussianKernel::default(), input, 1.0);
        let s = out.samples16().unwrap();
        // Samples next to a step move off the terrace level
        assert!(s[3] > 0 && s[3] < 257);
        assert!(s[4] > 0 && s[4] < 257);
    }

    #[test]
    fn reports_available() {
        assert_eq!(GaussianKernel::default().status(), KernelStatus::Available);
        assert_eq!(GaussianKernel::default().name(), "gaussian");
    }
}
