//! Append-only dead-letter store.

use tokio::sync::Mutex;

use crate::domain::{DeadLetterEntry, JobId};

#[derive(Default)]
pub struct DeadLetterStore {
    entries: Mutex<Vec<DeadLetterEntry>>,
}

impl DeadLetterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, entry: DeadLetterEntry) {
        self.entries.lock().await.push(entry);
    }

    /// Snapshot copy in insertion order.
    pub async fn list(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn find_by_job(&self, job_id: JobId) -> Vec<DeadLetterEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Job, JobType};
    use chrono::Utc;

    fn entry(id: u64, reason: &str) -> DeadLetterEntry {
        let job = Job::new(JobId::new(id), JobType::new("always_fail"), "payload");
        DeadLetterEntry::from_job(&job, reason, Utc::now())
    }

    #[tokio::test]
    async fn entries_keep_their_reason() {
        let dlq = DeadLetterStore::new();
        dlq.push(entry(1, "timeout")).await;

        let entries = dlq.list().await;
        assert_eq!(entries[0].reason, "timeout");
    }

    #[tokio::test]
    async fn find_by_job_filters() {
        let dlq = DeadLetterStore::new();
        assert!(dlq.is_empty().await);

        dlq.push(entry(1, "a")).await;
        dlq.push(entry(2, "b")).await;

        assert_eq!(dlq.len().await, 2);
        let found = dlq.find_by_job(JobId::new(2)).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reason, "b");
    }
}
