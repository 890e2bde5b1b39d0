//! Job record and status management.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TransitionError;
use super::ids::JobId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobType(String);

impl JobType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for JobType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Job status.
///
/// State transitions:
/// - Queued -> Processing -> Done
/// - Queued -> Processing -> Queued (retry, loops until max_attempts)
/// - Queued -> Processing -> Failed (max_attempts reached, dead-lettered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting in the work queue (or in retry backoff).
    Queued,

    /// Picked up by a worker.
    Processing,

    /// Handler succeeded.
    Done,

    /// Retry budget exhausted.
    Failed,
}

impl JobStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A unit of asynchronous work.
///
/// Design:
/// - Owned by the `JobStore`; the worker mutates a copy and persists it.
/// - State transitions via methods (not direct field access), so a terminal
///   job can never be moved again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    #[serde(rename = "type")]
    pub job_type: JobType,

    pub payload: String,

    pub status: JobStatus,

    /// Number of times a worker picked this job up.
    pub attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Job {
    pub fn new(id: JobId, job_type: JobType, payload: impl Into<String>) -> Self {
        Self {
            id,
            job_type,
            payload: payload.into(),
            status: JobStatus::Queued,
            attempts: 0,
            last_error: None,
        }
    }

    /// queued -> processing (increments attempts).
    pub fn start_attempt(&mut self) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Queued, "start_attempt")?;
        self.status = JobStatus::Processing;
        self.attempts += 1;
        Ok(())
    }

    /// processing -> done (clears last error).
    pub fn mark_done(&mut self) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Processing, "mark_done")?;
        self.status = JobStatus::Done;
        self.last_error = None;
        Ok(())
    }

    /// processing -> queued, remembering why the attempt failed.
    pub fn requeue(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Processing, "requeue")?;
        self.status = JobStatus::Queued;
        self.last_error = Some(error.into());
        Ok(())
    }

    /// processing -> failed.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.expect_status(JobStatus::Processing, "mark_failed")?;
        self.status = JobStatus::Failed;
        self.last_error = Some(error.into());
        Ok(())
    }

    fn expect_status(
        &self,
        expected: JobStatus,
        action: &'static str,
    ) -> Result<(), TransitionError> {
        if self.status != expected {
            return Err(TransitionError::InvalidTransition {
                job_id: self.id,
                from: self.status,
                action,
            });
        }
        Ok(())
    }
}
