//! MemoryPublisher - テスト・デモ用の配送先

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{EventId, OutboxEvent, PublishError};
use crate::ports::EventPublisher;

/// Records published event ids. `fail_first(n)` makes the first `n` calls
/// fail to simulate a flaky broker.
#[derive(Default)]
pub struct MemoryPublisher {
    sent: Mutex<Vec<EventId>>,
    remaining_failures: AtomicU32,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_first(n: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            remaining_failures: AtomicU32::new(n),
        }
    }

    /// Ids in publish order. Redeliveries show up more than once.
    pub fn sent(&self) -> Vec<EventId> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, event: &OutboxEvent) -> Result<(), PublishError> {
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(PublishError::new(format!(
                "simulated publish failure for {}",
                event.id
            )));
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| PublishError::new("publisher state poisoned"))?;
        sent.push(event.id.clone());
        debug!(event_id = %event.id, event_type = %event.event_type, "published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::{DomainEvent, TaskId};

    fn event(seq: u64) -> OutboxEvent {
        let domain = DomainEvent::TaskCreated {
            task_id: TaskId::new(seq),
            title: "t".to_string(),
        };
        OutboxEvent::from_domain(EventId::from_sequence(seq), &domain, Utc::now())
    }

    #[tokio::test]
    async fn records_sent_ids() {
        let publisher = MemoryPublisher::new();
        publisher.publish(&event(1)).await.unwrap();
        publisher.publish(&event(2)).await.unwrap();
        assert_eq!(
            publisher.sent(),
            vec![EventId::from_sequence(1), EventId::from_sequence(2)]
        );
    }

    #[tokio::test]
    async fn fail_first_fails_then_recovers() {
        let publisher = MemoryPublisher::fail_first(2);
        assert!(publisher.publish(&event(1)).await.is_err());
        assert!(publisher.publish(&event(1)).await.is_err());
        assert!(publisher.publish(&event(1)).await.is_ok());
        assert_eq!(publisher.sent().len(), 1);
    }
}
