//! Relief Convert - Heightmap blur pipeline and load/export
//!
//! Drives the iterative blur that removes terracing from expanded 8-bit
//! heightmaps. Jobs are polled cooperatively through `tick`; kernels run
//! off-thread and report through a completion fence. Also hosts the
//! layered configuration and the file-level load/export entry points.

pub mod clock;
pub mod completion;
pub mod config;
pub mod job;
pub mod kernel;
pub mod kernels;
pub mod pipeline;
pub mod scheduler;

pub use clock::TickClock;
pub use completion::{CancellationToken, CompletionStrategy, DEFAULT_FIXED_DELAY};
pub use config::{CompletionMode, ReliefConfig};
pub use job::{
    CompletionCallback, ConversionJob, ConversionRequest, JobOptions, JobState, DEFAULT_INTENSITY,
    ITERATIONS,
};
pub use kernel::{BlurKernel, KernelBinding, KernelFence, KernelOutput, KernelStatus};
pub use kernels::{GaussianKernel, IdentityKernel, UnavailableKernel};
pub use pipeline::{
    apply_to_host, default_export_path, export_heightmap, load_heightmap, prepare,
    HeightmapSource, LoadPlan, PreparedHeightmap, RAW_SIDE,
};
pub use scheduler::{ConversionScheduler, JobFailure};
