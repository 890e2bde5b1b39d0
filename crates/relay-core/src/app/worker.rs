use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::worker_loop::WorkerLoop;
use crate::queue::WorkReceiver;

/// Worker group handle.
/// - `request_shutdown()` で新しいジョブの受け取りを止める
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers sharing one receiver.
    pub fn spawn(n: usize, receiver: WorkReceiver, worker: Arc<WorkerLoop>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let rx = receiver.clone();
            let w = Arc::clone(&worker);
            let mut shutdown = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, rx, w, &mut shutdown).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Request shutdown for all workers.
    /// In-flight handler calls are not cancelled; workers just stop taking
    /// new jobs.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: WorkReceiver,
    worker: Arc<WorkerLoop>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        // shutdown が来ていたら抜ける
        if *shutdown_rx.borrow() {
            break;
        }

        // recv は「待つ」ので select で shutdown と競合させる
        let job = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                // 変更が入ったら次のループで判定
                continue;
            }
            job = receiver.recv() => job,
        };

        // 送信側が全部いなくなった
        let Some(job) = job else {
            break;
        };

        worker.process(job).await;
    }
    debug!(worker_id, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::{Job, JobStatus, JobType};
    use crate::ports::{HandlerFn, SystemClock};
    use crate::queue::{DeadLetterStore, JobStore, RetryPolicy, RetryScheduler, channel};

    #[tokio::test]
    async fn workers_drain_the_queue_and_stop_on_shutdown() {
        let store = Arc::new(JobStore::new());
        let (queue, rx) = channel(10);
        let (_sched_tx, sched_rx) = watch::channel(false);
        let (retry, _join) = RetryScheduler::spawn(queue.clone(), sched_rx);
        let worker = Arc::new(WorkerLoop::new(
            store.clone(),
            Arc::new(DeadLetterStore::new()),
            Arc::new(HandlerFn::new(|_job: &Job| Ok(()))),
            retry,
            RetryPolicy::default(),
            Arc::new(SystemClock),
        ));

        let group = WorkerGroup::spawn(3, rx, worker);
        assert_eq!(group.len(), 3);

        let mut ids = Vec::new();
        for i in 0..6 {
            let job = store.add(JobType::new("ok"), format!("{i}")).await;
            ids.push(job.id);
            queue.enqueue(job).await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(2), async {
            while store.counts().await.done < 6 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(1), group.shutdown_and_join())
            .await
            .unwrap();

        for id in ids {
            assert_eq!(store.get(id).await.unwrap().status, JobStatus::Done);
        }
    }
}
