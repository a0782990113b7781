//! Blur kernel trait, buffer bindings and completion fences

use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use relief_core::{ReliefError, Result};
use relief_terrain::HeightmapBuffer;

/// Status returned by a kernel health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelStatus {
    Available,
    Unavailable(String),
}

/// Buffers and parameters for one kernel dispatch.
///
/// Both buffers are moved into the dispatch, so nothing else can read or
/// write them until the fence hands them back.
#[derive(Debug)]
pub struct KernelBinding {
    pub input: HeightmapBuffer,
    pub output: HeightmapBuffer,
    pub intensity: f32,
}

impl KernelBinding {
    /// Bind a 16-bit input and an output of the same size
    pub fn new(input: HeightmapBuffer, output: HeightmapBuffer, intensity: f32) -> Result<Self> {
        if !intensity.is_finite() {
            return Err(ReliefError::KernelError(format!(
                "blur intensity must be a finite number, got {}",
                intensity
            )));
        }
        input.expect_gray16()?;
        output.expect_gray16()?;
        if input.width() != output.width() || input.height() != output.height() {
            return Err(ReliefError::KernelError(format!(
                "output binding is {}x{} but input is {}x{}",
                output.width(),
                output.height(),
                input.width(),
                input.height()
            )));
        }
        Ok(Self {
            input,
            output,
            intensity: intensity.clamp(0.0, 1.0),
        })
    }

    /// Split into the buffers returned through the fence
    pub fn into_output(self) -> KernelOutput {
        KernelOutput {
            input: self.input,
            output: self.output,
        }
    }
}

/// Buffers handed back once a dispatch has finished writing
#[derive(Debug)]
pub struct KernelOutput {
    /// The buffer the kernel read from
    pub input: HeightmapBuffer,
    /// The buffer the kernel wrote into
    pub output: HeightmapBuffer,
}

/// Trait implemented by each blur backend
pub trait BlurKernel: Send + Sync {
    /// Kernel name (e.g. "gaussian", "identity")
    fn name(&self) -> &str;

    /// Check whether the kernel can accept dispatches
    fn status(&self) -> KernelStatus;

    /// Start blurring `binding.input` into `binding.output`.
    /// Returns immediately; the fence signals once the output is fully written.
    fn dispatch(&self, binding: KernelBinding) -> Result<KernelFence>;
}

/// Receiving side of a dispatch's completion signal
pub struct KernelFence {
    receiver: Receiver<Result<KernelOutput>>,
}

/// Sending side of a dispatch's completion signal
pub struct FenceSignal {
    sender: Sender<Result<KernelOutput>>,
}

/// Create a connected signal/fence pair
pub fn fence() -> (FenceSignal, KernelFence) {
    let (sender, receiver) = bounded(1);
    (FenceSignal { sender }, KernelFence { receiver })
}

impl FenceSignal {
    /// Mark the dispatch finished. A fence that was already dropped is ignored.
    pub fn signal(self, result: Result<KernelOutput>) {
        let _ = self.sender.send(result);
    }
}

impl KernelFence {
    /// A fence that has already passed
    pub fn signaled(result: Result<KernelOutput>) -> Self {
        let (signal, fence) = fence();
        signal.signal(result);
        fence
    }

    /// Non-blocking check. `None` while the kernel is still writing.
    pub fn poll(&self) -> Option<Result<KernelOutput>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(dropped_signal())),
        }
    }

    /// Block until the kernel signals
    pub fn wait(self) -> Result<KernelOutput> {
        self.receiver.recv().map_err(|_| dropped_signal())?
    }
}

fn dropped_signal() -> ReliefError {
    ReliefError::KernelError("kernel dropped its fence without signaling".to_string())
}
