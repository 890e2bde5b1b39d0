//! Outbox event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::events::DomainEvent;
use super::ids::EventId;

/// An event recorded in the outbox alongside the domain write that caused it.
///
/// `delivered` only ever moves false -> true (see [`OutboxEvent::mark_delivered`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: EventId,
    pub event_type: String,

    /// Payload schema version, starting at 1.
    pub version: u32,

    pub occurred_at: DateTime<Utc>,
    pub payload: Map<String, Value>,
    delivered: bool,
}

impl OutboxEvent {
    pub fn from_domain(id: EventId, event: &DomainEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            event_type: event.event_type().to_string(),
            version: event.version(),
            occurred_at,
            payload: event.payload(),
            delivered: false,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Returns `true` if this call flipped the flag.
    pub fn mark_delivered(&mut self) -> bool {
        let changed = !self.delivered;
        self.delivered = true;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;

    #[test]
    fn new_event_is_pending_and_delivery_is_monotonic() {
        let domain = DomainEvent::TaskCreated {
            task_id: TaskId::new(1),
            title: "a".to_string(),
        };
        let mut event = OutboxEvent::from_domain(EventId::from_sequence(1), &domain, Utc::now());

        assert!(!event.is_delivered());
        assert_eq!(event.version, 1);
        assert_eq!(event.event_type, "task.created");

        assert!(event.mark_delivered());
        assert!(!event.mark_delivered());
        assert!(event.is_delivered());
    }
}
