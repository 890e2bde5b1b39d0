//! InMemoryTaskRepository - タスクと outbox を 1 つのロックで書く
//!
//! # 学習ポイント
//! - ドメイン書き込みとイベント追加を同じクリティカルセクションで行う
//!   （DB なら同じトランザクション）
//! - 配送は dispatcher に任せ、repository は publish しない

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DomainEvent, EventId, OutboxEvent, Task, TaskId};
use crate::ports::{Clock, OutboxStore, SystemClock};

struct RepoState {
    tasks: Vec<Task>,
    outbox: Vec<OutboxEvent>,
    next_task_id: TaskId,
    next_event_seq: u64,
}

/// InMemoryTaskRepository は開発用の正本
///
/// # 実装詳細
/// - tasks と outbox を同じ Mutex で保護
/// - outbox は追記のみ。delivered フラグだけが false -> true に変わる
pub struct InMemoryTaskRepository {
    state: Mutex<RepoState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RepoState {
                tasks: Vec::new(),
                outbox: Vec::new(),
                next_task_id: TaskId::new(1),
                next_event_seq: 1,
            }),
            clock,
        }
    }

    /// Create a task and its `task.created` event atomically.
    pub async fn create_with_outbox(&self, title: impl Into<String>) -> Task {
        let title = title.into();
        let mut state = self.state.lock().await;

        let task_id = state.next_task_id;
        state.next_task_id = task_id.next();
        let task = Task::new(task_id, title.clone());
        state.tasks.push(task.clone());

        let seq = state.next_event_seq;
        state.next_event_seq += 1;
        let event = DomainEvent::TaskCreated { task_id, title };
        state.outbox.push(OutboxEvent::from_domain(
            EventId::from_sequence(seq),
            &event,
            self.clock.now(),
        ));

        task
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn get_task(&self, id: TaskId) -> Option<Task> {
        let state = self.state.lock().await;
        state.tasks.iter().find(|t| t.id == id).cloned()
    }

    /// All events, delivered or not.
    pub async fn outbox(&self) -> Vec<OutboxEvent> {
        self.state.lock().await.outbox.clone()
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutboxStore for InMemoryTaskRepository {
    async fn pending_outbox(&self) -> Vec<OutboxEvent> {
        let state = self.state.lock().await;
        state
            .outbox
            .iter()
            .filter(|e| !e.is_delivered())
            .cloned()
            .collect()
    }

    async fn mark_delivered(&self, event_id: &EventId) -> bool {
        let mut state = self.state.lock().await;
        match state.outbox.iter_mut().find(|e| &e.id == event_id) {
            Some(event) => event.mark_delivered(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::ports::FixedClock;

    #[tokio::test]
    async fn create_writes_task_and_event_together() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let repo = InMemoryTaskRepository::with_clock(Arc::new(FixedClock::new(at)));

        let task = repo.create_with_outbox("learn outbox").await;
        assert_eq!(task.id, TaskId::new(1));
        assert_eq!(repo.get_task(task.id).await, Some(task.clone()));

        let pending = repo.pending_outbox().await;
        assert_eq!(pending.len(), 1);
        let event = &pending[0];
        assert_eq!(event.id.as_str(), "outbox-1");
        assert_eq!(event.event_type, "task.created");
        assert_eq!(event.version, 1);
        assert_eq!(event.occurred_at, at);
        assert_eq!(event.payload["task_id"], 1);
        assert_eq!(event.payload["title"], "learn outbox");
    }

    #[tokio::test]
    async fn each_create_adds_one_pending_event() {
        let repo = InMemoryTaskRepository::new();
        for i in 1..=3 {
            repo.create_with_outbox(format!("task {i}")).await;
            assert_eq!(repo.pending_outbox().await.len(), i);
        }
        let ids: Vec<_> = repo.outbox().await.into_iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["outbox-1", "outbox-2", "outbox-3"]);
    }

    #[tokio::test]
    async fn mark_delivered_is_idempotent() {
        let repo = InMemoryTaskRepository::new();
        repo.create_with_outbox("a").await;
        repo.create_with_outbox("b").await;
        let first = EventId::from_sequence(1);

        assert!(repo.mark_delivered(&first).await);
        assert!(!repo.mark_delivered(&first).await);
        assert!(!repo.mark_delivered(&EventId::new("outbox-404")).await);

        let pending = repo.pending_outbox().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.as_str(), "outbox-2");
        assert_eq!(repo.outbox().await.len(), 2);
    }

    #[tokio::test]
    async fn pending_snapshot_is_detached() {
        let repo = InMemoryTaskRepository::new();
        repo.create_with_outbox("a").await;

        let mut snapshot = repo.pending_outbox().await;
        snapshot[0].mark_delivered();
        snapshot[0].payload.clear();

        let pending = repo.pending_outbox().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload["title"], "a");
    }
}
