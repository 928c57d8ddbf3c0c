use crate::{Error, Result};
use rand::Rng;
use std::time::Duration;

/// Produces randomized pauses between consecutive actions.
///
/// The pause is the engine's only pacing mechanism, so the bounds are
/// validated once at construction rather than on every draw.
pub struct DelayScheduler {
    min: Duration,
    max: Duration,
}

impl DelayScheduler {
    /// Create a scheduler for the inclusive range `[min, max]`.
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(Error::Config(format!(
                "delay range is inverted: min {}s > max {}s",
                min.as_secs(),
                max.as_secs()
            )));
        }

        Ok(Self { min, max })
    }

    /// Draw the next inter-action pause, uniform across the range.
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }

        let span = (self.max - self.min).as_secs_f64();
        let jitter = rand::thread_rng().gen_range(0.0..=span);
        self.min + Duration::from_secs_f64(jitter)
    }
}
