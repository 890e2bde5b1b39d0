//! App - アプリケーション層
//!
//! このモジュールは、queue / ports / impls を組み合わせてジョブ処理と
//! outbox 配送を動かします。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **Runtime**: 起動済みの処理系（submit, 参照, shutdown）
//! - **WorkerLoop**: ジョブ 1 件の処理（processing→done / retry / dead-letter）
//! - **WorkerGroup**: ワーカーの起動と停止
//! - **OutboxDispatcher**: Outbox イベントの配送
//! - **TaskService**: outbox に書くビジネス操作

pub mod builder;
pub mod outbox;
pub mod registry;
pub mod runtime;
pub mod service;
pub mod worker;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::outbox::{FlushReport, OutboxDispatcher};
pub use self::registry::HandlerRegistry;
pub use self::runtime::Runtime;
pub use self::service::TaskService;
pub use self::worker::WorkerGroup;
pub use self::worker_loop::{Outcome, WorkerLoop};
