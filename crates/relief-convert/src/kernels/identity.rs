//! Passthrough and unavailable kernels
//!
//! `IdentityKernel` copies its input and signals immediately, which makes the
//! driver's behavior observable without any smoothing. `UnavailableKernel`
//! stands in for a backend that failed to initialize.

use std::sync::atomic::{AtomicU32, Ordering};

use relief_core::{ReliefError, Result};

use crate::kernel::{BlurKernel, KernelBinding, KernelFence, KernelStatus};

/// A kernel that leaves the heightmap unchanged
#[derive(Default)]
pub struct IdentityKernel {
    dispatches: AtomicU32,
}

impl IdentityKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dispatches received so far
    pub fn dispatches(&self) -> u32 {
        self.dispatches.load(Ordering::SeqCst)
    }
}

impl BlurKernel for IdentityKernel {
    fn name(&self) -> &str {
        "identity"
    }

    fn status(&self) -> KernelStatus {
        KernelStatus::Available
    }

    fn dispatch(&self, mut binding: KernelBinding) -> Result<KernelFence> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);

        let src = binding.input.expect_gray16()?.to_vec();
        binding
            .output
            .samples16_mut()
            .ok_or_else(|| ReliefError::KernelError("output binding is not 16-bit".to_string()))?
            .copy_from_slice(&src);

        Ok(KernelFence::signaled(Ok(binding.into_output())))
    }
}

/// A kernel whose backend could not be loaded
pub struct UnavailableKernel {
    reason: String,
}

impl UnavailableKernel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl BlurKernel for UnavailableKernel {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn status(&self) -> KernelStatus {
        KernelStatus::Unavailable(self.reason.clone())
    }

    fn dispatch(&self, _binding: KernelBinding) -> Result<KernelFence> {
        Err(ReliefError::DependencyUnavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_terrain::HeightmapBuffer;

    #[test]
    fn identity_copies_and_counts() {
        let kernel = IdentityKernel::new();
        let binding = KernelBinding::new(
            HeightmapBuffer::from_gray16(2, 1, vec![5, 6]).unwrap(),
            HeightmapBuffer::filled16(2, 1, 0),
            1.0,
        )
        .unwrap();

        let out = kernel.dispatch(binding).unwrap().poll().unwrap().unwrap();
        assert_eq!(out.output.samples16().unwrap(), &[5, 6]);
        assert_eq!(kernel.dispatches(), 1);
    }

    #[test]
    fn unavailable_refuses_dispatch() {
        let kernel = UnavailableKernel::new("compute backend missing");
        assert_eq!(
            kernel.status(),
            KernelStatus::Unavailable("compute backend missing".to_string())
        );

        let binding = KernelBinding::new(
            HeightmapBuffer::filled16(1, 1, 0),
            HeightmapBuffer::filled16(1, 1, 0),
            1.0,
        )
        .unwrap();
        assert!(matches!(
            kernel.dispatch(binding),
            Err(ReliefError::DependencyUnavailable(_))
        ));
    }
}
