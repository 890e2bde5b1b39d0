//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryTaskRepository**: タスク + outbox の正本（OutboxStore）
//! - **MemoryPublisher**: 送信記録つきの EventPublisher
//! - **InMemoryEventBus**: event_type ごとの pub/sub（EventPublisher）

pub mod event_bus;
pub mod inmem_outbox;
pub mod memory_publisher;

// 主要な型を再エクスポート
pub use self::event_bus::{InMemoryEventBus, Subscriber};
pub use self::inmem_outbox::InMemoryTaskRepository;
pub use self::memory_publisher::MemoryPublisher;
