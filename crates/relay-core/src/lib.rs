//! relay-core
//!
//! In-process building blocks for reliable background work and event delivery.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, dead_letter, task, events, outbox, errors）
//! - **ports**: 抽象化レイヤー（JobHandler, EventPublisher, OutboxStore, Clock）
//! - **queue**: JobStore, DeadLetterStore, 有界 WorkQueue, RetryPolicy, RetryScheduler
//! - **app**: アプリケーションロジック（builder, runtime, worker_loop, outbox dispatcher）
//! - **impls**: 実装（InMemoryTaskRepository, MemoryPublisher, InMemoryEventBus）
//! - **config**: JSON で読める設定
//! - **observability**: QueueCounts と tracing の初期化
//!
//! # 配送保証
//! - ジョブ: 1 件ずつ at-most-once で handler に渡し、失敗は上限付きでリトライ、
//!   上限に達したら dead-letter に残る
//! - outbox: at-least-once。受け手は重複を許容すること

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
