//! InMemoryEventBus - event_type ごとの購読者へ同期配信する pub/sub
//!
//! outbox の配送先として使う場合、1 購読者でも失敗したら publish 全体を
//! 失敗扱いにします。イベントは pending に残って再配送されるので、
//! 購読者は重複を許容する必要があります。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::{OutboxEvent, PublishError};
use crate::ports::EventPublisher;

/// 購読者
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn on_event(&self, event: &OutboxEvent) -> Result<(), PublishError>;
}

#[derive(Default)]
pub struct InMemoryEventBus {
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn Subscriber>>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(
        &self,
        event_type: impl Into<String>,
        subscriber: Arc<dyn Subscriber>,
    ) {
        let mut subs = self.subscribers.write().await;
        subs.entry(event_type.into()).or_default().push(subscriber);
    }

    pub async fn subscriber_count(&self, event_type: &str) -> usize {
        let subs = self.subscribers.read().await;
        subs.get(event_type).map_or(0, Vec::len)
    }

    /// Call every subscriber for the event's type, in subscription order, and
    /// collect their errors. An event nobody listens to is not an error.
    pub async fn publish_all(&self, event: &OutboxEvent) -> Vec<PublishError> {
        // ロックは await を跨がない
        let targets: Vec<Arc<dyn Subscriber>> = {
            let subs = self.subscribers.read().await;
            subs.get(&event.event_type).cloned().unwrap_or_default()
        };

        let mut errors = Vec::new();
        for sub in targets {
            if let Err(e) = sub.on_event(event).await {
                warn!(event_id = %event.id, error = %e, "subscriber failed");
                errors.push(e);
            }
        }
        errors
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: &OutboxEvent) -> Result<(), PublishError> {
        let errors = self.publish_all(event).await;
        if errors.is_empty() {
            return Ok(());
        }
        let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Err(PublishError::new(format!(
            "{} subscriber(s) failed: {}",
            errors.len(),
            joined.join("; ")
        )))
    }
}
