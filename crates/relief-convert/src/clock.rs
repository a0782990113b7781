//! Fixed-rate clock for driving conversion jobs from a blocking loop

use std::time::{Duration, Instant};

/// Default scheduler rate
pub const DEFAULT_TICK_HZ: f64 = 60.0;

/// Measures the time between scheduler ticks and paces the loop
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    /// `None` until the first tick
    last: Option<Instant>,
    elapsed: Duration,
    ticks: u64,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::with_rate(DEFAULT_TICK_HZ)
    }
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock ticking `hz` times per second (at least once per second)
    pub fn with_rate(hz: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / hz.max(1.0)),
            last: None,
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Target time between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time accumulated over all ticks
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the clock and return the time since the previous tick.
    /// The first tick only starts the clock and returns zero.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = match self.last.replace(now) {
            Some(prev) => now.duration_since(prev),
            None => Duration::ZERO,
        };
        self.elapsed += delta;
        self.ticks += 1;
        delta
    }

    /// Sleep out whatever is left of the current interval
    pub fn pace(&self) {
        if let Some(last) = self.last {
            let spent = last.elapsed();
            if spent < self.interval {
                std::thread::sleep(self.interval - spent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_is_60hz() {
        let clock = TickClock::new();
        assert!((clock.interval().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn rate_has_a_floor() {
        assert_eq!(TickClock::with_rate(0.0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn first_tick_starts_the_clock() {
        let mut clock = TickClock::with_rate(30.0);
        assert_eq!(clock.tick(), Duration::ZERO);
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn pace_waits_out_the_interval() {
        let mut clock = TickClock::with_rate(200.0);
        clock.tick();
        clock.pace();
        let delta = clock.tick();
        assert!(delta >= Duration::from_millis(4));
        assert_eq!(clock.elapsed(), delta);
    }
}
