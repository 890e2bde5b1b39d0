//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use super::registry::HandlerRegistry;
use super::runtime::Runtime;
use crate::config::{ConfigError, RelayConfig};
use crate::domain::{JobType, RelayError};
use crate::ports::{Clock, JobHandler, SystemClock};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .register("send_email", Arc::new(SendEmail))?
///     .expect_job_types(&["send_email"])
///     .build()?;
/// let runtime = app.start();
/// ```
///
/// # Fail-fast 設計
/// - expect_job_types() で期待される job_type を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」と config をチェック
/// - 不足があれば BuildError を返す
pub struct AppBuilder {
    registry: HandlerRegistry,
    config: RelayConfig,
    clock: Arc<dyn Clock>,
    expected_types: Option<Vec<String>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing job types: {0:?}. These job types were expected but not registered.")]
    MissingJobTypes(Vec<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppBuilder {
    /// 新しい AppBuilder を作成
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            config: RelayConfig::default(),
            clock: Arc::new(SystemClock),
            expected_types: None,
        }
    }

    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// DLQ の `occurred_at` に使う時計（テスト用に差し替え可能）
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handler を登録
    pub fn register(
        mut self,
        job_type: impl Into<JobType>,
        handler: Arc<dyn JobHandler>,
    ) -> Result<Self, RelayError> {
        self.registry.register(job_type.into(), handler)?;
        Ok(self)
    }

    /// 期待される job_type のリストを設定
    pub fn expect_job_types(mut self, job_types: &[&str]) -> Self {
        self.expected_types = Some(job_types.iter().map(|t| t.to_string()).collect());
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - config の値域
    /// - expect_job_types() で設定された job_type が全て登録されているか
    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;

        if let Some(expected) = &self.expected_types {
            let registered = self.registry.registered_types();
            let missing: Vec<String> = expected
                .iter()
                .filter(|t| !registered.iter().any(|r| r.as_str() == t.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingJobTypes(missing));
            }
        }

        Ok(App {
            registry: Arc::new(self.registry),
            config: self.config,
            clock: self.clock,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は検証済みの構成。`start()` でワーカーが動き出す。
pub struct App {
    registry: Arc<HandlerRegistry>,
    config: RelayConfig,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Spawn the retry scheduler and workers. Must be called inside a tokio
    /// runtime.
    pub fn start(self) -> Runtime {
        Runtime::start(&self.config, self.registry, self.clock)
    }
}
