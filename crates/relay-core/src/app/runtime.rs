//! Runtime - 起動済みのジョブ処理系
//!
//! store / dead-letter / work queue / retry scheduler / worker group をまとめて持ち、
//! 呼び出し側には submit と参照系だけを見せます。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::worker::WorkerGroup;
use super::worker_loop::WorkerLoop;
use crate::config::RelayConfig;
use crate::domain::{DeadLetterEntry, Job, JobId, JobType, RelayError};
use crate::observability::QueueCounts;
use crate::ports::{Clock, JobHandler};
use crate::queue::{self, DeadLetterStore, JobStore, RetryScheduler, WorkQueue};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct Runtime {
    store: Arc<JobStore>,
    dead_letters: Arc<DeadLetterStore>,
    queue: WorkQueue,
    workers: WorkerGroup,
    scheduler_shutdown: watch::Sender<bool>,
    scheduler: JoinHandle<()>,
}

impl Runtime {
    /// Wire everything up and spawn the scheduler and workers.
    ///
    /// `config` is expected to be validated already.
    pub(crate) fn start(
        config: &RelayConfig,
        handler: Arc<dyn JobHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(JobStore::new());
        let dead_letters = Arc::new(DeadLetterStore::new());
        let (work_queue, receiver) = queue::channel(config.queue_capacity);

        let (scheduler_shutdown, scheduler_rx) = watch::channel(false);
        let (retry, scheduler) = RetryScheduler::spawn(work_queue.clone(), scheduler_rx);

        let worker = Arc::new(WorkerLoop::new(
            store.clone(),
            dead_letters.clone(),
            handler,
            retry,
            config.retry_policy(),
            clock,
        ));
        let workers = WorkerGroup::spawn(config.workers, receiver, worker);

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            max_attempts = config.retry.max_attempts,
            "runtime started"
        );

        Self {
            store,
            dead_letters,
            queue: work_queue,
            workers,
            scheduler_shutdown,
            scheduler,
        }
    }

    /// Record a new job and hand it to the workers.
    ///
    /// Waits while the work queue is full.
    pub async fn submit(
        &self,
        job_type: impl Into<JobType>,
        payload: impl Into<String>,
    ) -> Result<Job, RelayError> {
        let job = self.store.add(job_type.into(), payload).await;
        debug!(job_id = %job.id, job_type = %job.job_type, "job submitted");
        self.queue.enqueue(job.clone()).await?;
        Ok(job)
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn dead_letters(&self) -> &Arc<DeadLetterStore> {
        &self.dead_letters
    }

    pub fn work_queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub async fn counts(&self) -> QueueCounts {
        self.store.counts().await
    }

    pub async fn dead_letter_list(&self) -> Vec<DeadLetterEntry> {
        self.dead_letters.list().await
    }

    /// Poll the store until the job is `done` or `failed`.
    pub async fn wait_for_terminal(&self, id: JobId, timeout: Duration) -> Result<Job, RelayError> {
        let deadline = Instant::now() + timeout;
        loop {
            let job = self
                .store
                .get(id)
                .await
                .ok_or(RelayError::JobNotFound(id))?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            if Instant::now() >= deadline {
                return Err(RelayError::Timeout { id, waited: timeout });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Stop taking new jobs, let in-flight handlers finish, then stop the
    /// retry scheduler.
    pub async fn shutdown(self) {
        self.workers.shutdown_and_join().await;
        let _ = self.scheduler_shutdown.send(true);
        let _ = self.scheduler.await;
        info!("runtime stopped");
    }
}
