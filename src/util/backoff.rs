//! Interval growth between poll attempts.

use std::time::Duration;

/// Stepper that yields successive wait intervals.
///
/// Starts at `initial`, multiplies by `multiplier` after each step and never
/// exceeds `max`. A multiplier of `1.0` gives a fixed interval.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            max,
            multiplier,
        }
    }

    /// Interval to wait before the next attempt.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return the current interval and advance to the next one.
    pub fn next_interval(&mut self) -> Duration {
        let interval = self.current;
        let grown = (self.current.as_secs_f64() * self.multiplier).min(self.max.as_secs_f64());
        self.current = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.max)
            .min(self.max);
        interval
    }
}
