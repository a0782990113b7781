//! Drives any number of conversion jobs from a single loop

use std::time::Duration;

use relief_core::{ReliefError, Result};

use crate::clock::TickClock;
use crate::job::{ConversionJob, JobState};

/// A job that ended with an error during a scheduler tick
#[derive(Debug)]
pub struct JobFailure {
    pub job_id: String,
    pub error: ReliefError,
}

/// Owns in-flight jobs and ticks them cooperatively
#[derive(Default)]
pub struct ConversionScheduler {
    jobs: Vec<ConversionJob>,
}

impl ConversionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a job and take ownership of it. Returns the job id.
    pub fn submit(&mut self, mut job: ConversionJob) -> Result<String> {
        job.start()?;
        let id = job.id().to_string();
        if !job.state().is_terminal() {
            self.jobs.push(job);
        }
        Ok(id)
    }

    /// Tick every job once and drop those that finished
    pub fn tick(&mut self, delta: Duration) -> Vec<JobFailure> {
        let mut failures = Vec::new();

        for job in &mut self.jobs {
            if let Err(error) = job.tick(delta) {
                failures.push(JobFailure {
                    job_id: job.id().to_string(),
                    error,
                });
            }
        }

        self.jobs.retain(|job| !job.state().is_terminal());
        failures
    }

    /// Number of jobs still in flight
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    /// States of the jobs still in flight, by id
    pub fn states(&self) -> Vec<(&str, JobState)> {
        self.jobs.iter().map(|j| (j.id(), j.state())).collect()
    }

    /// Tick at the clock's rate until every job has finished
    pub fn run_until_idle(&mut self, clock: &mut TickClock) -> Vec<JobFailure> {
        let mut failures = Vec::new();
        clock.tick();
        while !self.is_idle() {
            clock.pace();
            let delta = clock.tick();
            failures.extend(self.tick(delta));
        }
        failures
    }
}
