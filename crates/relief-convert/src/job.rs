//! Iterative blur job
//!
//! A `ConversionJob` walks `Idle -> Running(0..ITERATIONS) -> Completed`.
//! Each iteration binds the working buffer as the kernel's input and the
//! spare buffer as its output; when the fence passes, the output becomes
//! the next working buffer and the old input becomes the next spare.
//! `tick` never blocks, so many jobs can be driven from one loop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use relief_core::{ReliefError, Result};
use relief_terrain::HeightmapBuffer;

use crate::completion::{CancellationToken, CompletionStrategy};
use crate::kernel::{BlurKernel, KernelBinding, KernelFence, KernelOutput, KernelStatus};

/// Blur passes per conversion
pub const ITERATIONS: u32 = 4;

/// Blur intensity used for heightmap conversions
pub const DEFAULT_INTENSITY: f32 = 1.0;

/// Receives the finished 16-bit heightmap
pub type CompletionCallback = Box<dyn FnOnce(HeightmapBuffer) + Send>;

/// Source data for a conversion
#[derive(Debug)]
pub enum ConversionRequest {
    /// Raw 8-bit samples, expanded to 16-bit before the first pass
    Raw8 { bytes: Vec<u8>, width: u32, height: u32 },
    /// A decoded heightmap; 8-bit buffers are expanded as well
    Buffer(HeightmapBuffer),
}

/// Lifecycle of a conversion job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running { iteration: u32 },
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    /// True once the job can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Idle => write!(f, "idle"),
            JobState::Running { iteration } => {
                write!(f, "running (iteration {}/{})", iteration + 1, ITERATIONS)
            }
            JobState::Completed => write!(f, "completed"),
            JobState::Cancelled => write!(f, "cancelled"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Per-job tuning
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub intensity: f32,
    pub completion: CompletionStrategy,
    pub cancel: CancellationToken,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_INTENSITY,
            completion: CompletionStrategy::default(),
            cancel: CancellationToken::new(),
        }
    }
}

/// One in-flight heightmap blur
pub struct ConversionJob {
    id: String,
    kernel: Arc<dyn BlurKernel>,
    options: JobOptions,
    state: JobState,
    request: Option<ConversionRequest>,
    /// Buffer bound as the output of the next dispatch
    spare: Option<HeightmapBuffer>,
    fence: Option<KernelFence>,
    /// Time since the current dispatch
    waited: Duration,
    overrun_reported: bool,
    dispatches: u32,
    on_complete: Option<CompletionCallback>,
}

impl ConversionJob {
    /// Create an idle job. Fails before any dispatch if the kernel is
    /// missing or reports itself unavailable.
    pub fn new<F>(
        request: ConversionRequest,
        kernel: Option<Arc<dyn BlurKernel>>,
        options: JobOptions,
        on_complete: F,
    ) -> Result<Self>
    where
        F: FnOnce(HeightmapBuffer) + Send + 'static,
    {
        let kernel = kernel.ok_or_else(|| {
            ReliefError::DependencyUnavailable("no blur kernel was provided".to_string())
        })?;

        if let KernelStatus::Unavailable(reason) = kernel.status() {
            return Err(ReliefError::DependencyUnavailable(format!(
                "blur kernel '{}' is unavailable: {}",
                kernel.name(),
                reason
            )));
        }

        if !options.intensity.is_finite() {
            return Err(ReliefError::ConfigError(format!(
                "blur intensity must be a finite number, got {}",
                options.intensity
            )));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            kernel,
            options,
            state: JobState::Idle,
            request: Some(request),
            spare: None,
            fence: None,
            waited: Duration::ZERO,
            overrun_reported: false,
            dispatches: 0,
            on_complete: Some(Box::new(on_complete)),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Number of kernel dispatches issued so far
    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }

    /// Token that cancels this job when triggered
    pub fn cancel_token(&self) -> CancellationToken {
        self.options.cancel.clone()
    }

    /// Move from `Idle` to `Running(0)` and dispatch the first pass
    pub fn start(&mut self) -> Result<()> {
        if self.state != JobState::Idle {
            return Err(ReliefError::InvalidState(format!(
                "job {} cannot start while {}",
                self.id, self.state
            )));
        }

        if self.options.cancel.is_cancelled() {
            self.cancel();
            return Ok(());
        }

        let request = self
            .request
            .take()
            .ok_or_else(|| ReliefError::InvalidState("job has no source data".to_string()))?;

        let working = match prepare_working(request) {
            Ok(working) => working,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        log::info!(
            "Conversion job {} running: {}x{}, {} iterations on '{}'",
            self.id,
            working.width(),
            working.height(),
            ITERATIONS,
            self.kernel.name()
        );

        self.spare = Some(HeightmapBuffer::filled16(
            working.width(),
            working.height(),
            0,
        ));
        if let Err(e) = self.dispatch(0, working) {
            self.fail(&e);
            return Err(e);
        }
        Ok(())
    }

    /// Advance the job by one scheduler step. Never blocks.
    pub fn tick(&mut self, delta: Duration) -> Result<JobState> {
        let iteration = match self.state {
            JobState::Running { iteration } => iteration,
            other => return Ok(other),
        };

        if self.options.cancel.is_cancelled() {
            self.cancel();
            return Ok(self.state);
        }

        self.waited += delta;
        if !self.options.completion.ready_to_poll(self.waited) {
            return Ok(self.state);
        }

        let polled = match &self.fence {
            Some(fence) => fence.poll(),
            None => Some(Err(ReliefError::InvalidState(
                "running job has no kernel fence".to_string(),
            ))),
        };

        match polled {
            None => {
                self.report_overrun();
                Ok(self.state)
            }
            Some(Err(e)) => {
                self.fail(&e);
                Err(e)
            }
            Some(Ok(KernelOutput { input, output })) => {
                self.fence = None;
                self.spare = Some(input);

                if iteration + 1 < ITERATIONS {
                    if let Err(e) = self.dispatch(iteration + 1, output) {
                        self.fail(&e);
                        return Err(e);
                    }
                    Ok(self.state)
                } else {
                    self.finish(output);
                    Ok(self.state)
                }
            }
        }
    }

    /// Bind buffers and dispatch one pass
    fn dispatch(&mut self, iteration: u32, working: HeightmapBuffer) -> Result<()> {
        let output = match self.spare.take() {
            Some(spare) => spare,
            None => HeightmapBuffer::filled16(working.width(), working.height(), 0),
        };

        log::debug!(
            "Conversion job {}: running iteration {}",
            self.id,
            iteration
        );

        let binding = KernelBinding::new(working, output, self.options.intensity)?;
        let fence = self.kernel.dispatch(binding)?;

        self.fence = Some(fence);
        self.waited = Duration::ZERO;
        self.overrun_reported = false;
        self.dispatches += 1;
        self.state = JobState::Running { iteration };
        Ok(())
    }

    fn report_overrun(&mut self) {
        if let Some(delay) = self.options.completion.delay() {
            if !self.overrun_reported {
                log::warn!(
                    "Conversion job {}: kernel still busy {:.2}s after dispatch (fixed delay {:.2}s); waiting for its signal",
                    self.id,
                    self.waited.as_secs_f64(),
                    delay.as_secs_f64()
                );
                self.overrun_reported = true;
            }
        }
    }

    fn finish(&mut self, output: HeightmapBuffer) {
        self.state = JobState::Completed;
        self.release();
        log::info!("Conversion job {} finished", self.id);

        if let Some(on_complete) = self.on_complete.take() {
            on_complete(output);
        }
    }

    fn cancel(&mut self) {
        self.state = JobState::Cancelled;
        self.on_complete = None;
        self.release();
        log::info!("Conversion job {} cancelled", self.id);
    }

    fn fail(&mut self, err: &ReliefError) {
        self.state = JobState::Failed;
        self.on_complete = None;
        self.release();
        log::error!("Conversion job {} failed: {}", self.id, err);
    }

    fn release(&mut self) {
        self.request = None;
        self.spare = None;
        self.fence = None;
    }
}

fn prepare_working(request: ConversionRequest) -> Result<HeightmapBuffer> {
    match request {
        ConversionRequest::Raw8 {
            bytes,
            width,
            height,
        } => Ok(HeightmapBuffer::from_gray8(width, height, bytes)?.into_gray16()),
        ConversionRequest::Buffer(buffer) => Ok(buffer.into_gray16()),
    }
}
