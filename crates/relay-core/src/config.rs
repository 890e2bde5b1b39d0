//! Configuration for the job queue and the outbox dispatcher.
//!
//! Everything here is still handed to constructors explicitly; this module only
//! gives the knobs a serde shape so a binary can load them from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::{Backoff, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("queue_capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("workers must be at least 1")]
    ZeroWorkers,

    #[error("retry.max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("retry.base_delay_ms must be at least 1")]
    ZeroBaseDelay,

    #[error("retry.backoff multiplier must be greater than 1.0, got {0}")]
    NonIncreasingMultiplier(f64),

    #[error("outbox.flush_interval_ms must be at least 1")]
    ZeroFlushInterval,

    #[error("invalid config json: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Work queue buffer; `enqueue` blocks once this many jobs are waiting.
    pub queue_capacity: usize,

    /// Number of workers draining the work queue.
    pub workers: usize,

    pub retry: RetryConfig,
    pub outbox: OutboxConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            workers: 1,
            retry: RetryConfig::default(),
            outbox: OutboxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            backoff: Backoff::Linear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxConfig {
    pub flush_interval_ms: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 500,
        }
    }
}

impl OutboxConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl RelayConfig {
    /// Parse and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        if self.retry.base_delay_ms == 0 {
            return Err(ConfigError::ZeroBaseDelay);
        }
        if let Backoff::Exponential { multiplier } = self.retry.backoff
            && multiplier.partial_cmp(&1.0) != Some(std::cmp::Ordering::Greater)
        {
            return Err(ConfigError::NonIncreasingMultiplier(multiplier));
        }
        if self.outbox.flush_interval_ms == 0 {
            return Err(ConfigError::ZeroFlushInterval);
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            backoff: self.retry.backoff,
        }
    }
}
