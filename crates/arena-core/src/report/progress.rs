//! Best-effort progress reporting for an external status poller.
//!
//! Nothing here is authoritative: the store is. Sink failures are logged by
//! [`emit`] and never reach the round loop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub execution_id: String,
    pub status: ProgressStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub team_id: String,
    pub team_name: String,
    /// Collaborator currently working: `submitter`, `evaluator`, `judge`, or empty.
    pub current_agent: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, update: &ProgressUpdate) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn report(&self, _update: &ProgressUpdate) -> anyhow::Result<()> {
        Ok(())
    }
}

pub type ProgressFn = Arc<dyn Fn(&ProgressUpdate) -> anyhow::Result<()> + Send + Sync>;

/// Forwards every update to a closure.
#[derive(Clone)]
pub struct CallbackProgressSink {
    f: ProgressFn,
}

impl CallbackProgressSink {
    pub fn new(f: ProgressFn) -> Self {
        Self { f }
    }
}

#[async_trait]
impl ProgressSink for CallbackProgressSink {
    async fn report(&self, update: &ProgressUpdate) -> anyhow::Result<()> {
        (self.f)(update)
    }
}

/// Keeps the latest update in a JSON file, replaced atomically on each report.
#[derive(Debug, Clone)]
pub struct JsonFileProgressSink {
    path: PathBuf,
}

impl JsonFileProgressSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ProgressSink for JsonFileProgressSink {
    async fn report(&self, update: &ProgressUpdate) -> anyhow::Result<()> {
        let path = self.path.clone();
        let update = update.clone();
        tokio::task::spawn_blocking(move || super::json::write_json_atomic(&update, &path))
            .await
            .map_err(|e| anyhow::anyhow!("progress write task failed: {}", e))?
    }
}

/// Report and swallow any failure.
pub async fn emit(sink: &dyn ProgressSink, update: ProgressUpdate) {
    if let Err(e) = sink.report(&update).await {
        tracing::warn!(
            execution_id = %update.execution_id,
            team_id = %update.team_id,
            status = ?update.status,
            error = %e,
            "progress sink failed"
        );
    }
}
