//! Retry scheduler: delayed re-submission of failed jobs.
//!
//! The worker hands a failed job and its backoff delay to the scheduler and
//! goes straight back to the work queue. The scheduler keeps a min-heap of
//! deadlines and re-enqueues each job when its time comes, so one job's
//! backoff never stalls the others.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::work_queue::WorkQueue;
use crate::domain::{Job, RelayError};

/// Scheduled entry for the priority queue.
///
/// We use Reverse ordering so BinaryHeap acts as a min-heap (earliest first);
/// `seq` keeps FIFO order between equal deadlines.
#[derive(Debug)]
struct ScheduledJob {
    ready_at: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.ready_at == other.ready_at && self.seq == other.seq
    }
}

impl Eq for ScheduledJob {}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ready_at
            .cmp(&self.ready_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Handle for scheduling retries. Cheap to clone.
#[derive(Clone)]
pub struct RetryHandle {
    tx: mpsc::UnboundedSender<(Instant, Job)>,
}

impl RetryHandle {
    /// Re-submit `job` to the work queue after `delay`.
    pub fn schedule(&self, job: Job, delay: Duration) -> Result<(), RelayError> {
        let ready_at = Instant::now()
            .checked_add(delay)
            .unwrap_or_else(far_future);
        self.tx
            .send((ready_at, job))
            .map_err(|_| RelayError::SchedulerStopped)
    }
}

// ~30 years, same trick tokio uses for "never"
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86400 * 365 * 30)
}

pub struct RetryScheduler {
    queue: WorkQueue,
    rx: mpsc::UnboundedReceiver<(Instant, Job)>,
    heap: BinaryHeap<ScheduledJob>,
    next_seq: u64,
}

impl RetryScheduler {
    /// Spawn the scheduler task.
    ///
    /// It runs until `shutdown` flips to `true` (or its sender is dropped), or
    /// until every `RetryHandle` is gone and nothing is left to fire. Jobs still
    /// waiting at shutdown are dropped; the store keeps them as `queued`.
    pub fn spawn(
        queue: WorkQueue,
        shutdown: watch::Receiver<bool>,
    ) -> (RetryHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            queue,
            rx,
            heap: BinaryHeap::new(),
            next_seq: 0,
        };
        let join = tokio::spawn(scheduler.run(shutdown));
        (RetryHandle { tx }, join)
    }

    fn push(&mut self, ready_at: Instant, job: Job) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledJob { ready_at, seq, job });
    }

    fn pop_due(&mut self, now: Instant) -> Option<ScheduledJob> {
        if self.heap.peek()?.ready_at > now {
            return None; // Heap is sorted, so we can stop
        }
        self.heap.pop()
    }

    /// Hand a due job to the work queue, waiting while it is full.
    ///
    /// Gives the entry back only if shutdown was requested before a slot
    /// freed up. A watch notification that leaves the flag `false` keeps
    /// waiting with the same job.
    async fn resubmit(
        &self,
        entry: ScheduledJob,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<ScheduledJob> {
        let job_id = entry.job.id;
        loop {
            // enqueue は満杯だと待つので shutdown と競合させる
            tokio::select! {
                res = self.queue.enqueue(entry.job.clone()) => {
                    match res {
                        Ok(()) => debug!(job_id = %job_id, "retry re-submitted"),
                        Err(e) => warn!(job_id = %job_id, error = %e, "retry re-submission failed"),
                    }
                    return None;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Some(entry);
                    }
                }
            }
        }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut handles_open = true;

        'run: loop {
            if *shutdown.borrow() {
                break;
            }

            while let Some(entry) = self.pop_due(Instant::now()) {
                if let Some(entry) = self.resubmit(entry, &mut shutdown).await {
                    // 停止要求: 元の位置に戻してから抜ける
                    self.heap.push(entry);
                    break 'run;
                }
            }

            if !handles_open && self.heap.is_empty() {
                break;
            }

            let next_wake = self.heap.peek().map(|entry| entry.ready_at);

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                msg = self.rx.recv(), if handles_open => match msg {
                    Some((ready_at, job)) => self.push(ready_at, job),
                    None => handles_open = false,
                },
                _ = tokio::time::sleep_until(next_wake.unwrap_or_else(far_future)),
                    if next_wake.is_some() => {}
            }
        }

        if !self.heap.is_empty() {
            info!(
                pending = self.heap.len(),
                "retry scheduler stopped with pending retries"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobId, JobType};
    use crate::queue::work_queue;

    fn job(id: u64) -> Job {
        Job::new(JobId::new(id), JobType::new("unstable"), "")
    }

    #[tokio::test]
    async fn job_is_resubmitted_after_delay() {
        let (queue, rx) = work_queue::channel(10);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, _join) = RetryScheduler::spawn(queue, shutdown_rx);

        let started = Instant::now();
        handle.schedule(job(1), Duration::from_millis(30)).unwrap();

        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.id, JobId::new(1));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn earlier_deadline_fires_first() {
        let (queue, rx) = work_queue::channel(10);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, _join) = RetryScheduler::spawn(queue, shutdown_rx);

        handle.schedule(job(1), Duration::from_millis(80)).unwrap();
        handle.schedule(job(2), Duration::from_millis(5)).unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.id, JobId::new(2));
        assert_eq!(second.id, JobId::new(1));
    }

    #[tokio::test]
    async fn shutdown_stops_scheduler() {
        let (queue, _rx) = work_queue::channel(10);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, join) = RetryScheduler::spawn(queue, shutdown_rx);

        handle.schedule(job(1), Duration::from_secs(60)).unwrap();
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), join)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            handle.schedule(job(2), Duration::ZERO),
            Err(RelayError::SchedulerStopped)
        ));
    }

    #[tokio::test]
    async fn watch_notification_without_shutdown_keeps_the_job() {
        let (queue, rx) = work_queue::channel(1);
        queue.enqueue(job(1)).await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, _join) = RetryScheduler::spawn(queue, shutdown_rx);

        handle.schedule(job(2), Duration::ZERO).unwrap();
        // 満杯の queue で待っている間に false を送る
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(false).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(rx.recv().await.unwrap().id, JobId::new(1));
        let resubmitted = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resubmitted.id, JobId::new(2));
    }

    #[tokio::test]
    async fn shutdown_while_queue_is_full_stops_scheduler() {
        let (queue, _rx) = work_queue::channel(1);
        queue.enqueue(job(1)).await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, join) = RetryScheduler::spawn(queue, shutdown_rx);

        handle.schedule(job(2), Duration::ZERO).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), join)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn heap_orders_by_deadline_then_sequence() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(ScheduledJob {
            ready_at: now + Duration::from_millis(5),
            seq: 0,
            job: job(1),
        });
        heap.push(ScheduledJob {
            ready_at: now,
            seq: 2,
            job: job(3),
        });
        heap.push(ScheduledJob {
            ready_at: now,
            seq: 1,
            job: job(2),
        });

        let order: Vec<_> =
            std::iter::from_fn(|| heap.pop().map(|e| e.job.id.as_u64())).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
