//! WorkerLoop - ジョブ 1 件の処理
//!
//! # フロー
//! 1. `start_attempt()` で processing へ（attempts+1）、store に保存
//! 2. handler 実行（store のロックは持たない）
//! 3. 成功 → done
//! 4. 失敗 → リトライ可能なら queued に戻して RetryScheduler へ、
//!    そうでなければ failed + dead-letter

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{DeadLetterEntry, Job, JobError};
use crate::ports::{Clock, JobHandler};
use crate::queue::{DeadLetterStore, JobStore, RetryHandle, RetryPolicy};

/// What happened to a job after one pass through the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    RetryScheduled(Duration),
    DeadLettered,
    /// The job was not in a state a worker can pick up.
    Skipped,
}

pub struct WorkerLoop {
    store: Arc<JobStore>,
    dead_letters: Arc<DeadLetterStore>,
    handler: Arc<dyn JobHandler>,
    retry: RetryHandle,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl WorkerLoop {
    pub fn new(
        store: Arc<JobStore>,
        dead_letters: Arc<DeadLetterStore>,
        handler: Arc<dyn JobHandler>,
        retry: RetryHandle,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dead_letters,
            handler,
            retry,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one job to its next resting state. Handler failures are recorded
    /// on the job and never returned to the caller.
    pub async fn process(&self, mut job: Job) -> Outcome {
        if let Err(e) = job.start_attempt() {
            warn!(job_id = %job.id, error = %e, "skipping job");
            return Outcome::Skipped;
        }
        self.store.update(job.clone()).await;

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempts = job.attempts,
            "processing job"
        );

        match self.handler.handle(&job).await {
            Ok(()) => self.succeed(job).await,
            Err(err) => self.fail(job, err).await,
        }
    }

    async fn succeed(&self, mut job: Job) -> Outcome {
        if let Err(e) = job.mark_done() {
            warn!(job_id = %job.id, error = %e, "could not mark job done");
            return Outcome::Skipped;
        }
        info!(job_id = %job.id, attempts = job.attempts, "job done");
        self.store.update(job).await;
        Outcome::Done
    }

    async fn fail(&self, mut job: Job, err: JobError) -> Outcome {
        let reason = err.to_string();

        if err.is_retryable() && self.policy.should_retry(job.attempts) {
            let delay = self.policy.next_delay(job.attempts);
            if let Err(e) = job.requeue(reason.as_str()) {
                warn!(job_id = %job.id, error = %e, "could not requeue job");
                return Outcome::Skipped;
            }
            warn!(
                job_id = %job.id,
                attempts = job.attempts,
                delay_ms = delay.as_millis() as u64,
                error = %reason,
                "job failed, retry scheduled"
            );
            self.store.update(job.clone()).await;

            let job_id = job.id;
            if let Err(e) = self.retry.schedule(job, delay) {
                // shutdown 中: ジョブは queued のまま残る
                warn!(job_id = %job_id, error = %e, "retry not scheduled");
            }
            return Outcome::RetryScheduled(delay);
        }

        if let Err(e) = job.mark_failed(reason.as_str()) {
            warn!(job_id = %job.id, error = %e, "could not mark job failed");
            return Outcome::Skipped;
        }
        warn!(
            job_id = %job.id,
            attempts = job.attempts,
            error = %reason,
            "job failed permanently, moved to dead-letter"
        );
        let entry = DeadLetterEntry::from_job(&job, reason, self.clock.now());
        self.store.update(job).await;
        self.dead_letters.push(entry).await;
        Outcome::DeadLettered
    }
}
