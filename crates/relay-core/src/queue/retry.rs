//! Retry policy: decides backoff delays and when to give up.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `attempt * base_delay`
    Linear,

    /// `base_delay * multiplier^(attempt - 1)`; `multiplier` must be > 1.0.
    Exponential { multiplier: f64 },
}

/// Retry policy for failed jobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total tries, first attempt included.
    pub max_attempts: u32,

    /// Delay for the first retry.
    pub base_delay: Duration,

    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Linear,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Exponential { multiplier },
        }
    }

    /// Calculate the delay before re-submitting a job.
    ///
    /// # Arguments
    /// * `attempt` - Number of attempts already made (1-indexed).
    ///
    /// `attempt == 0` yields `base_delay`. For `attempt >= 1` the delay strictly
    /// increases with `attempt` until it saturates at `Duration::MAX`: each
    /// attempt waits at least `base_delay + (attempt - 1)ns`, so a multiplier
    /// close to 1.0 (or a zero base) still grows by a nanosecond per attempt.
    ///
    /// Example with base_delay=100ms:
    /// - linear: 100ms, 200ms, 300ms, ...
    /// - exponential x2: 100ms, 200ms, 400ms, ...
    pub fn next_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.base_delay;
        }
        let computed = match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential { multiplier } => {
                let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                let secs = self.base_delay.as_secs_f64() * multiplier.powi(exponent);
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        };
        // f64 の丸めで隣の attempt と同じ値にならないよう 1ns 刻みの下限を置く
        let floor = self
            .base_delay
            .saturating_add(Duration::from_nanos(u64::from(attempt - 1)));
        computed.max(floor)
    }

    /// Is another try allowed after `attempts` tries have failed?
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 100ms linear backoff.
    fn default() -> Self {
        Self::linear(3, Duration::from_millis(100))
    }
}
