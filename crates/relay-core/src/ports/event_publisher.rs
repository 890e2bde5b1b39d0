//! EventPublisher port - outbox イベントの配送先
//!
//! 具体的な配送先（broker, log, memory）は外部の協調者です。
//!
//! # 冪等性
//! outbox は at-least-once なので、同じイベントが複数回 publish されることがあります。
//! 受け手は重複を許容する必要があります。

use async_trait::async_trait;

use crate::domain::{OutboxEvent, PublishError};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &OutboxEvent) -> Result<(), PublishError>;
}
