//! OutboxStore port - dispatcher から見た outbox の読み書き
//!
//! ドメイン書き込みとイベント追加の原子性は実装側（repository）の責務です。
//! dispatcher は pending の取得と delivered マークだけを使います。

use async_trait::async_trait;

use crate::domain::{EventId, OutboxEvent};

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Undelivered events, as a snapshot copy in creation order.
    async fn pending_outbox(&self) -> Vec<OutboxEvent>;

    /// Idempotent: unknown or already delivered ids are a no-op.
    /// Returns whether the event transitioned to delivered.
    async fn mark_delivered(&self, event_id: &EventId) -> bool;
}
