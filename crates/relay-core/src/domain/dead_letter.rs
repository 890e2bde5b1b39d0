//! Dead-letter entries: immutable snapshots of jobs that exhausted retries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::job::{Job, JobType};

/// A permanently failed job, preserved for inspection or manual recovery.
///
/// Created once by the worker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub job_id: JobId,
    pub job_type: JobType,
    pub payload: String,

    /// Attempts made before giving up.
    pub attempts: u32,

    /// Error text of the final attempt.
    pub reason: String,

    pub occurred_at: DateTime<Utc>,
}

impl DeadLetterEntry {
    pub fn from_job(job: &Job, reason: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            job_id: job.id,
            job_type: job.job_type.clone(),
            payload: job.payload.clone(),
            attempts: job.attempts,
            reason: reason.into(),
            occurred_at,
        }
    }
}
