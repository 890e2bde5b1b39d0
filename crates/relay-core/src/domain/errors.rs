//! Errors - エラー型と分類
//!
//! - `JobError`: handler が返す失敗（ErrorKind で運用分類）
//! - `PublishError`: EventPublisher が返す失敗
//! - `TransitionError`: Job の状態遷移違反
//! - `RelayError`: ライブラリ API のエラー

use std::time::Duration;

use thiserror::Error;

use super::ids::JobId;
use super::job::{JobStatus, JobType};
use crate::config::ConfigError;

/// ErrorKind は handler エラーの分類
///
/// - Transient: 一時的なエラー（max_attempts までリトライ）
/// - Permanent: 恒久的なエラー（リトライせず即 dead-letter）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
}

/// JobError は handler の失敗
///
/// Display はメッセージのみを出力します（DLQ の reason にそのまま入るため）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct JobError {
    kind: ErrorKind,
    message: String,
}

impl JobError {
    /// Retryable failure. Same as [`JobError::transient`].
    pub fn new(message: impl Into<String>) -> Self {
        Self::transient(message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

/// Failure reported by an `EventPublisher`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PublishError(pub String);

impl PublishError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job {job_id}: cannot {action} from status={from}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        action: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("work queue is closed")]
    QueueClosed,

    #[error("work queue is full")]
    QueueFull,

    #[error("retry scheduler has stopped")]
    SchedulerStopped,

    #[error("duplicate handler for job_type={0}")]
    DuplicateHandler(JobType),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("job {id} did not reach a terminal status within {waited:?}")]
    Timeout { id: JobId, waited: Duration },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_error_displays_only_the_message() {
        let err = JobError::new("permanent failure");
        assert_eq!(err.to_string(), "permanent failure");
        assert!(err.is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        let err = JobError::permanent("bad payload");
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert!(!err.is_retryable());
    }

    #[test]
    fn relay_error_messages() {
        let err = RelayError::DuplicateHandler(JobType::new("unstable"));
        assert_eq!(err.to_string(), "duplicate handler for job_type=unstable");

        let err = RelayError::JobNotFound(JobId::new(999));
        assert_eq!(err.to_string(), "job not found: job-999");
    }
}
