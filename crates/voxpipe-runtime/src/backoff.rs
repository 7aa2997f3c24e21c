//! Escalating wait for a busy but silent synthesizer.

use std::time::Duration;

use voxpipe_core::BackoffConfig;

/// Wait ladder: `initial`, `initial * factor`, ... up to `ceiling`.
///
/// A silent wait at the ceiling exhausts the ladder. Any I/O readiness
/// resets it.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    factor: f64,
    ceiling: Duration,
    current: Duration,
    waited: Duration,
}

impl Backoff {
    pub fn new(config: &BackoffConfig) -> Self {
        let initial = config.initial().min(config.ceiling());
        Self {
            initial,
            factor: config.factor,
            ceiling: config.ceiling(),
            current: initial,
            waited: Duration::ZERO,
        }
    }

    /// Timeout for the next wait.
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// Silent time accumulated since the last reset.
    pub const fn waited(&self) -> Duration {
        self.waited
    }

    pub const fn reset(&mut self) {
        self.current = self.initial;
        self.waited = Duration::ZERO;
    }

    /// Account for a wait that timed out and step up the ladder.
    ///
    /// Returns `None` once a wait at the ceiling has gone unanswered.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn escalate(&mut self) -> Option<Duration> {
        self.waited += self.current;
        if self.current >= self.ceiling {
            return None;
        }
        // Scale whole nanoseconds so integral factors stay exact.
        let scaled = (self.current.as_nanos() as f64 * self.factor).round();
        self.current = if scaled >= self.ceiling.as_nanos() as f64 {
            self.ceiling
        } else {
            Duration::from_nanos(scaled as u64)
        };
        Some(self.current)
    }
}
