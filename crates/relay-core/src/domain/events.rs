//! Events - ドメインイベント
//!
//! ビジネス上意味のある事実を型で表現します。
//! outbox に書き込む際に `event_type` / `version` / `payload` へ展開されます。

use serde_json::{Map, Value, json};

use super::ids::TaskId;

/// DomainEvent はドメインで発生したイベント
///
/// # バージョニング
/// payload の形を変えたら `version()` を上げる（consumer が形の変化を検知できるように）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    TaskCreated { task_id: TaskId, title: String },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::TaskCreated { .. } => "task.created",
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            DomainEvent::TaskCreated { .. } => 1,
        }
    }

    pub fn payload(&self) -> Map<String, Value> {
        let value = match self {
            DomainEvent::TaskCreated { task_id, title } => json!({
                "task_id": task_id,
                "title": title,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
