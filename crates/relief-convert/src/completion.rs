//! How the driver decides an iteration has finished, and how it is stopped

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-iteration wait used by the fixed-delay fallback
pub const DEFAULT_FIXED_DELAY: Duration = Duration::from_secs(3);

/// Completion detection for kernel dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionStrategy {
    /// Poll the kernel's fence every tick
    #[default]
    Signal,
    /// Leave the fence alone until a wall-clock delay has passed.
    /// The fence still has to pass before the output is read.
    #[cfg(feature = "fixed-delay")]
    FixedDelay(Duration),
}

impl CompletionStrategy {
    /// Whether the fence may be checked after waiting `waited` since dispatch
    #[cfg_attr(not(feature = "fixed-delay"), allow(unused_variables))]
    pub fn ready_to_poll(&self, waited: Duration) -> bool {
        match self {
            CompletionStrategy::Signal => true,
            #[cfg(feature = "fixed-delay")]
            CompletionStrategy::FixedDelay(delay) => waited >= *delay,
        }
    }

    /// The fixed delay, if this strategy has one
    pub fn delay(&self) -> Option<Duration> {
        match self {
            CompletionStrategy::Signal => None,
            #[cfg(feature = "fixed-delay")]
            CompletionStrategy::FixedDelay(delay) => Some(*delay),
        }
    }
}

/// Shared flag checked by a job between iterations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_polls_immediately() {
        assert!(CompletionStrategy::Signal.ready_to_poll(Duration::ZERO));
        assert_eq!(CompletionStrategy::default().delay(), None);
    }

    #[cfg(feature = "fixed-delay")]
    #[test]
    fn fixed_delay_waits_for_deadline() {
        let strategy = CompletionStrategy::FixedDelay(DEFAULT_FIXED_DELAY);
        assert!(!strategy.ready_to_poll(Duration::from_millis(2999)));
        assert!(strategy.ready_to_poll(Duration::from_secs(3)));
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
