//! OutboxDispatcher - outbox の pending イベントを配送
//!
//! # フロー
//! 1. `OutboxStore::pending_outbox()` でスナップショット取得
//! 2. `EventPublisher::publish()` で 1 件ずつ配送
//! 3. 成功したものだけ `mark_delivered()`
//! 4. 失敗したものは pending のまま次回の flush で再送（at-least-once）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::EventId;
use crate::ports::{EventPublisher, OutboxStore};

/// Result of one flush pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub sent: usize,
    pub failed: Vec<(EventId, String)>,
}

pub struct OutboxDispatcher {
    store: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl OutboxDispatcher {
    pub fn new(store: Arc<dyn OutboxStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Publish every pending event once. Returns how many were delivered.
    pub async fn flush_pending(&self) -> usize {
        self.flush_pending_report().await.sent
    }

    /// Same as [`flush_pending`](Self::flush_pending), but also reports which
    /// events failed and why.
    pub async fn flush_pending_report(&self) -> FlushReport {
        let pending = self.store.pending_outbox().await;
        let mut report = FlushReport::default();

        for event in pending {
            match self.publisher.publish(&event).await {
                Ok(()) => {
                    if !self.store.mark_delivered(&event.id).await {
                        debug!(event_id = %event.id, "event was already delivered");
                    }
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        error = %e,
                        "publish failed, event stays pending"
                    );
                    report.failed.push((event.id, e.to_string()));
                }
            }
        }
        report
    }

    /// Flush every `interval` until `shutdown` flips to `true`.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = self.flush_pending_report().await;
                    if report.sent > 0 || !report.failed.is_empty() {
                        info!(sent = report.sent, failed = report.failed.len(), "outbox flushed");
                    }
                }
            }
        }
        debug!("outbox dispatcher stopped");
    }
}
