//! Status views and log setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Number of jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.queued + self.processing + self.done + self.failed
    }

    /// queued / processing が 0 なら全ジョブが終端状態。
    pub fn is_settled(&self) -> bool {
        self.queued == 0 && self.processing == 0
    }
}

/// Install the global fmt subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `info`. Calling this
/// twice is harmless: the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
