use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Job, JobError, JobType, RelayError};
use crate::ports::JobHandler;

/// Registry of handlers (job_type -> handler).
///
/// Design:
/// - Built during initialization (mutable).
/// - Used during runtime (immutable, shared behind `Arc`).
///
/// The registry is itself a [`JobHandler`]: the worker hands it every job and
/// it dispatches on `job.job_type`.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a job type. A second registration for the same
    /// type is rejected.
    pub fn register(
        &mut self,
        job_type: JobType,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), RelayError> {
        if self.handlers.contains_key(&job_type) {
            return Err(RelayError::DuplicateHandler(job_type));
        }
        self.handlers.insert(job_type, handler);
        Ok(())
    }

    pub fn get(&self, job_type: &JobType) -> Option<&Arc<dyn JobHandler>> {
        self.handlers.get(job_type)
    }

    /// 登録済みの job_type 一覧（ソート済み）
    pub fn registered_types(&self) -> Vec<JobType> {
        let mut types: Vec<JobType> = self.handlers.keys().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl JobHandler for HandlerRegistry {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let handler = self.get(&job.job_type).ok_or_else(|| {
            JobError::permanent(format!("no handler for job type={}", job.job_type))
        })?;
        handler.handle(job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, JobId};
    use crate::ports::HandlerFn;

    fn ok_handler() -> Arc<dyn JobHandler> {
        Arc::new(HandlerFn::new(|_job: &Job| Ok(())))
    }

    #[tokio::test]
    async fn dispatches_by_job_type() {
        let mut reg = HandlerRegistry::new();
        reg.register(JobType::new("ok"), ok_handler()).unwrap();
        reg.register(
            JobType::new("always_fail"),
            Arc::new(HandlerFn::new(|_job: &Job| Err(JobError::new("permanent failure")))),
        )
        .unwrap();

        let ok = Job::new(JobId::new(1), JobType::new("ok"), "");
        let bad = Job::new(JobId::new(2), JobType::new("always_fail"), "");

        assert!(reg.handle(&ok).await.is_ok());
        assert_eq!(reg.handle(&bad).await.unwrap_err().message(), "permanent failure");
    }

    #[tokio::test]
    async fn missing_handler_is_permanent() {
        let reg = HandlerRegistry::new();
        let job = Job::new(JobId::new(1), JobType::new("missing"), "");

        let err = reg.handle(&job).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.to_string(), "no handler for job type=missing");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = HandlerRegistry::new();
        reg.register(JobType::new("ok"), ok_handler()).unwrap();

        let err = reg.register(JobType::new("ok"), ok_handler()).unwrap_err();
        assert!(matches!(err, RelayError::DuplicateHandler(t) if t.as_str() == "ok"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn registered_types_are_sorted() {
        let mut reg = HandlerRegistry::new();
        reg.register(JobType::new("unstable"), ok_handler()).unwrap();
        reg.register(JobType::new("always_fail"), ok_handler()).unwrap();

        let types: Vec<_> = reg.registered_types().iter().map(|t| t.to_string()).collect();
        assert_eq!(types, vec!["always_fail", "unstable"]);
    }
}
