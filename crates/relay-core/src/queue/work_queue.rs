//! Bounded FIFO hand-off between producers and workers.
//!
//! Backpressure policy: `enqueue` waits while the buffer is full instead of
//! dropping the job. Size the capacity to the expected burst.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::domain::{Job, RelayError};

/// Create a work queue with room for `capacity` jobs.
///
/// # Panics
/// Panics if `capacity` is zero (`RelayConfig::validate` rejects that first).
pub fn channel(capacity: usize) -> (WorkQueue, WorkReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        WorkQueue { tx },
        WorkReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side. Cheap to clone.
#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::Sender<Job>,
}

impl WorkQueue {
    /// Waits for a free slot if the queue is full.
    pub async fn enqueue(&self, job: Job) -> Result<(), RelayError> {
        self.tx.send(job).await.map_err(|_| RelayError::QueueClosed)
    }

    /// Non-blocking variant: fails with `QueueFull` instead of waiting.
    pub fn try_enqueue(&self, job: Job) -> Result<(), RelayError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RelayError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => RelayError::QueueClosed,
        })
    }

    /// Jobs currently buffered.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side.
///
/// Clones share one receiver, so a pool of workers drains the same queue and
/// each job is delivered to exactly one of them.
#[derive(Clone)]
pub struct WorkReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl WorkReceiver {
    /// Waits for the next job. `None` once every producer is gone and the
    /// buffer is drained.
    pub async fn recv(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobId, JobType};
    use std::time::Duration;

    fn job(id: u64) -> Job {
        Job::new(JobId::new(id), JobType::new("ok"), "")
    }

    #[tokio::test]
    async fn fifo_order() {
        let (queue, rx) = channel(10);
        queue.enqueue(job(1)).await.unwrap();
        queue.enqueue(job(2)).await.unwrap();
        assert_eq!(queue.len(), 2);

        assert_eq!(rx.recv().await.unwrap().id, JobId::new(1));
        assert_eq!(rx.recv().await.unwrap().id, JobId::new(2));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn full_queue_blocks_enqueue() {
        let (queue, rx) = channel(1);
        queue.enqueue(job(1)).await.unwrap();

        assert!(matches!(
            queue.try_enqueue(job(2)),
            Err(RelayError::QueueFull)
        ));

        let blocked = tokio::time::timeout(Duration::from_millis(50), queue.enqueue(job(2))).await;
        assert!(blocked.is_err(), "enqueue should wait while full");

        rx.recv().await.unwrap();
        tokio::time::timeout(Duration::from_millis(100), queue.enqueue(job(2)))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn enqueue_fails_once_receivers_are_gone() {
        let (queue, rx) = channel(1);
        drop(rx);
        assert!(queue.is_closed());
        assert!(matches!(
            queue.enqueue(job(1)).await,
            Err(RelayError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn shared_receivers_split_the_work() {
        let (queue, rx) = channel(10);
        let rx2 = rx.clone();
        for i in 1..=4 {
            queue.enqueue(job(i)).await.unwrap();
        }

        let mut seen = vec![
            rx.recv().await.unwrap().id,
            rx2.recv().await.unwrap().id,
            rx.recv().await.unwrap().id,
            rx2.recv().await.unwrap().id,
        ];
        seen.sort();
        assert_eq!(seen, (1..=4).map(JobId::new).collect::<Vec<_>>());
    }
}
