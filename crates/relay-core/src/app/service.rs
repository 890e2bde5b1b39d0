//! TaskService - outbox に書くだけのビジネス操作
//!
//! service は publish しない。配送は OutboxDispatcher の仕事。

use std::sync::Arc;

use tracing::info;

use crate::domain::Task;
use crate::impls::InMemoryTaskRepository;

pub struct TaskService {
    repo: Arc<InMemoryTaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<InMemoryTaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_task(&self, title: impl Into<String>) -> Task {
        let task = self.repo.create_with_outbox(title).await;
        info!(task_id = %task.id, "task created");
        task
    }
}
