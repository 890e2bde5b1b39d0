//! JobHandler port - ジョブのビジネスロジック
//!
//! worker は handler を呼ぶだけで、job_type による振り分けは handler 側
//! （`HandlerRegistry`）の責務です。

use async_trait::async_trait;

use crate::domain::{Job, JobError};

/// A handler for jobs.
///
/// Any `Err` is retried up to the policy bound unless it is
/// [`JobError::permanent`].
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}

/// Adapts a synchronous closure into a [`JobHandler`].
///
/// ```ignore
/// let handler = HandlerFn::new(|job: &Job| {
///     if job.payload.is_empty() {
///         return Err(JobError::permanent("empty payload"));
///     }
///     Ok(())
/// });
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(&Job) -> Result<(), JobError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> JobHandler for HandlerFn<F>
where
    F: Fn(&Job) -> Result<(), JobError> + Send + Sync,
{
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        (self.f)(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobId, JobType};

    #[tokio::test]
    async fn closure_handler_runs() {
        let handler = HandlerFn::new(|job: &Job| {
            if job.job_type.as_str() == "always_fail" {
                return Err(JobError::new("permanent failure"));
            }
            Ok(())
        });

        let ok = Job::new(JobId::new(1), JobType::new("ok"), "");
        let bad = Job::new(JobId::new(2), JobType::new("always_fail"), "");

        assert!(handler.handle(&ok).await.is_ok());
        let err = handler.handle(&bad).await.unwrap_err();
        assert_eq!(err.to_string(), "permanent failure");
    }
}
