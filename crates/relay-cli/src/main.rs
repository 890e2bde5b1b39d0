use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use relay_core::app::{AppBuilder, OutboxDispatcher, TaskService};
use relay_core::config::RelayConfig;
use relay_core::domain::{Job, JobError, JobId};
use relay_core::impls::{InMemoryTaskRepository, MemoryPublisher};
use relay_core::observability::init_tracing;
use relay_core::ports::{HandlerFn, JobHandler, OutboxStore};

#[derive(Debug, Deserialize)]
struct EmailPayload {
    to: String,
    subject: String,
}

/// 各ジョブの 1 回目だけ失敗する
#[derive(Default)]
struct UnstableHandler {
    seen: Mutex<HashSet<JobId>>,
}

#[async_trait]
impl JobHandler for UnstableHandler {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let first_try = self
            .seen
            .lock()
            .map_err(|_| JobError::permanent("handler state poisoned"))?
            .insert(job.id);
        if first_try {
            return Err(JobError::new("temporary failure"));
        }
        Ok(())
    }
}

struct SendEmailHandler;

#[async_trait]
impl JobHandler for SendEmailHandler {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let p: EmailPayload = serde_json::from_str(&job.payload)
            .map_err(|e| JobError::permanent(format!("json decode: {e}")))?;

        // 外部 API 呼び出しの代わり
        tokio::time::sleep(Duration::from_millis(10)).await;
        println!("email sent: to={} subject={:?}", p.to, p.subject);
        Ok(())
    }
}

fn load_config() -> Result<RelayConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(RelayConfig::from_json_str(&raw)?)
        }
        None => Ok(RelayConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = load_config()?;

    // (A) handler を登録して起動
    let runtime = AppBuilder::new()
        .config(config.clone())
        .register("unstable", Arc::new(UnstableHandler::default()))?
        .register(
            "always_fail",
            Arc::new(HandlerFn::new(|_job: &Job| Err(JobError::new("permanent failure")))),
        )?
        .register("send_email", Arc::new(SendEmailHandler))?
        .expect_job_types(&["unstable", "always_fail", "send_email"])
        .build()?
        .start();

    // (B) ジョブ投入
    let email = serde_json::json!({ "to": "ops@example.com", "subject": "weekly report" });
    let submitted = vec![
        runtime.submit("unstable", "first").await?,
        runtime.submit("unstable", "second").await?,
        runtime.submit("always_fail", "doomed").await?,
        runtime.submit("send_email", email.to_string()).await?,
    ];

    // (C) 完了をポーリングで待つ（done / failed のどちらか）
    for job in &submitted {
        let done = runtime
            .wait_for_terminal(job.id, Duration::from_secs(10))
            .await?;
        println!(
            "final status: id={} type={} status={} attempts={} last_error={:?}",
            done.id, done.job_type, done.status, done.attempts, done.last_error
        );
    }
    println!("counts: {:?}", runtime.counts().await);
    for entry in runtime.dead_letter_list().await {
        println!(
            "dead-letter: job={} attempts={} reason={}",
            entry.job_id, entry.attempts, entry.reason
        );
    }
    runtime.shutdown().await;

    // (D) outbox: 書き込みと配送は別。1 回目の publish は失敗させる
    let repo = Arc::new(InMemoryTaskRepository::new());
    let service = TaskService::new(repo.clone());
    let publisher = Arc::new(MemoryPublisher::fail_first(1));
    let dispatcher = OutboxDispatcher::new(repo.clone(), publisher.clone());

    service.create_task("learn outbox").await;
    service.create_task("ship relay").await;
    println!("pending before flush: {}", repo.pending_outbox().await.len());

    let first = dispatcher.flush_pending_report().await;
    println!("flush #1: sent={} failed={:?}", first.sent, first.failed);
    let second = dispatcher.flush_pending().await;
    println!("flush #2: sent={second}");
    println!(
        "pending after flush: {} published={:?}",
        repo.pending_outbox().await.len(),
        publisher.sent()
    );

    info!(interval_ms = config.outbox.flush_interval_ms, "demo finished");
    Ok(())
}
