//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の協調者（ビジネスロジック, イベント配送先, 時刻）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod clock;
pub mod event_publisher;
pub mod job_handler;
pub mod outbox_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_publisher::EventPublisher;
pub use self::job_handler::{HandlerFn, JobHandler};
pub use self::outbox_store::OutboxStore;
