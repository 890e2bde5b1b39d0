//! In-memory job store: the single source of truth for job status.

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use crate::domain::{Job, JobId, JobStatus, JobType};
use crate::observability::QueueCounts;

struct JobStoreState {
    /// Keyed by id so `list()` comes back in creation order.
    jobs: BTreeMap<JobId, Job>,

    /// Next job ID to assign.
    next_id: JobId,
}

/// Lock-guarded table of jobs.
///
/// Design:
/// - Only the four operations below touch the table; the map itself is never
///   handed out, so callers cannot mutate stored state through a snapshot.
/// - The lock is held for map mutation only, never across a handler call.
pub struct JobStore {
    state: Mutex<JobStoreState>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(JobStoreState {
                jobs: BTreeMap::new(),
                next_id: JobId::new(1),
            }),
        }
    }

    /// Create a job (`queued`, 0 attempts) with a fresh id.
    pub async fn add(&self, job_type: JobType, payload: impl Into<String>) -> Job {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id = id.next();

        let job = Job::new(id, job_type, payload);
        state.jobs.insert(id, job.clone());
        job
    }

    /// Overwrite the stored record with the same id (last writer wins).
    pub async fn update(&self, job: Job) {
        let mut state = self.state.lock().await;
        state.jobs.insert(job.id, job);
    }

    pub async fn get(&self, id: JobId) -> Option<Job> {
        let state = self.state.lock().await;
        state.jobs.get(&id).cloned()
    }

    /// Snapshot copy of every job.
    pub async fn list(&self) -> Vec<Job> {
        let state = self.state.lock().await;
        state.jobs.values().cloned().collect()
    }

    pub async fn counts(&self) -> QueueCounts {
        let state = self.state.lock().await;
        let mut counts = QueueCounts::default();
        for job in state.jobs.values() {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
