//! Durable aggregation store.
//!
//! `AggregationStore` describes where the database lives and initializes the schema.
//! Every caller (one per team loop) obtains its own [`StoreHandle`] through
//! [`AggregationStore::connect`]; handles never share a connection. All SQLite work
//! runs on the blocking pool, and each operation is wrapped in the retry policy.

use super::retry::{with_backoff, OpKind, RetryPolicy};
use super::store_internal::{executions, helpers, leader_board, rounds, validate};
use super::{now_rfc3339, schema, StoreError};
use crate::model::{
    ExecutionSummary, LeaderBoardEntry, RoundHistoryEntry, RoundStatusRecord, TeamRanking,
    TeamStatistics,
};
use rusqlite::{Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub retry: RetryPolicy,
    /// SQLite busy timeout applied to each connection.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregationStore {
    path: PathBuf,
    options: StoreOptions,
}

impl AggregationStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Create parent directories and the schema if missing.
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path, options };
        let conn = store.open_connection()?;
        conn.execute_batch(schema::DDL)?;
        tracing::debug!(path = %store.path.display(), "aggregation store initialized");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a dedicated connection for one caller.
    pub fn connect(&self) -> Result<StoreHandle, StoreError> {
        let conn = self.open_connection()?;
        Ok(StoreHandle {
            conn: Arc::new(Mutex::new(conn)),
            retry: self.options.retry.clone(),
        })
    }

    fn open_connection(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.options.busy_timeout)?;
        // WAL is best-effort: some filesystems refuse it and the store still works.
        let _ = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get::<_, String>(0));
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        Ok(conn)
    }
}

/// One caller's connection. Cloning shares the connection, so give each team loop its
/// own handle via [`AggregationStore::connect`] instead.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    conn: Arc<Mutex<Connection>>,
    retry: RetryPolicy,
}

impl StoreHandle {
    /// Persist a round's raw submission and message history.
    pub async fn save_aggregation(&self, history: &RoundHistoryEntry) -> Result<(), StoreError> {
        validate::history_entry_impl(history)?;
        let history = history.clone();
        self.write("save_aggregation", move |conn| {
            rounds::upsert_history_impl(conn, &history, &now_rfc3339())
        })
        .await
    }

    pub async fn save_to_leader_board(&self, entry: &LeaderBoardEntry) -> Result<(), StoreError> {
        validate::leader_board_entry_impl(entry)?;
        let entry = entry.clone();
        self.write("save_to_leader_board", move |conn| {
            leader_board::upsert_entry_impl(conn, &entry, &now_rfc3339())
        })
        .await
    }

    pub async fn save_round_status(&self, record: &RoundStatusRecord) -> Result<(), StoreError> {
        validate::round_status_impl(record)?;
        let record = record.clone();
        self.write("save_round_status", move |conn| {
            rounds::upsert_status_impl(conn, &record, &now_rfc3339())
        })
        .await
    }

    pub async fn save_execution_summary(&self, summary: &ExecutionSummary) -> Result<(), StoreError> {
        validate::execution_summary_impl(summary)?;
        let summary = summary.clone();
        self.write("save_execution_summary", move |conn| {
            executions::upsert_summary_impl(conn, &summary, &now_rfc3339())
        })
        .await
    }

    /// Clear any previous final flag for the team and set it on `round_number`.
    pub async fn mark_final_submission(
        &self,
        execution_id: &str,
        team_id: &str,
        round_number: u32,
        exit_reason: &str,
    ) -> Result<(), StoreError> {
        validate::key_impl(execution_id, team_id, round_number)?;
        let (execution_id, team_id, exit_reason) = (
            execution_id.to_string(),
            team_id.to_string(),
            exit_reason.to_string(),
        );
        self.write("mark_final_submission", move |conn| {
            leader_board::mark_final_impl(
                conn,
                &execution_id,
                &team_id,
                round_number,
                &exit_reason,
                &now_rfc3339(),
            )
        })
        .await
    }

    /// Top `limit` rows across all executions.
    pub async fn get_leader_board(&self, limit: u32) -> Result<Vec<LeaderBoardEntry>, StoreError> {
        self.read("get_leader_board", move |conn| {
            leader_board::top_entries_impl(conn, limit)
        })
        .await
    }

    pub async fn get_execution_leader_board(
        &self,
        execution_id: &str,
        limit: u32,
    ) -> Result<Vec<LeaderBoardEntry>, StoreError> {
        let execution_id = execution_id.to_string();
        self.read("get_execution_leader_board", move |conn| {
            leader_board::execution_entries_impl(conn, &execution_id, limit)
        })
        .await
    }

    pub async fn get_leader_board_ranking(
        &self,
        execution_id: &str,
    ) -> Result<Vec<TeamRanking>, StoreError> {
        let execution_id = execution_id.to_string();
        self.read("get_leader_board_ranking", move |conn| {
            leader_board::ranking_impl(conn, &execution_id)
        })
        .await
    }

    pub async fn get_team_statistics(&self, team_id: &str) -> Result<TeamStatistics, StoreError> {
        let team_id = team_id.to_string();
        self.read("get_team_statistics", move |conn| {
            leader_board::team_statistics_impl(conn, &team_id)
        })
        .await
    }

    pub async fn get_final_submission(
        &self,
        execution_id: &str,
        team_id: &str,
    ) -> Result<Option<LeaderBoardEntry>, StoreError> {
        let (execution_id, team_id) = (execution_id.to_string(), team_id.to_string());
        self.read("get_final_submission", move |conn| {
            leader_board::final_submission_impl(conn, &execution_id, &team_id)
        })
        .await
    }

    pub async fn get_round_history(
        &self,
        execution_id: &str,
        team_id: &str,
    ) -> Result<Vec<RoundHistoryEntry>, StoreError> {
        let (execution_id, team_id) = (execution_id.to_string(), team_id.to_string());
        self.read("get_round_history", move |conn| {
            rounds::history_impl(conn, &execution_id, &team_id)
        })
        .await
    }

    pub async fn get_round_status(
        &self,
        execution_id: &str,
        team_id: &str,
        round_number: u32,
    ) -> Result<Option<RoundStatusRecord>, StoreError> {
        let (execution_id, team_id) = (execution_id.to_string(), team_id.to_string());
        self.read("get_round_status", move |conn| {
            rounds::status_impl(conn, &execution_id, &team_id, round_number)
        })
        .await
    }

    pub async fn get_execution_summary(
        &self,
        execution_id: &str,
    ) -> Result<Option<ExecutionSummary>, StoreError> {
        let execution_id = execution_id.to_string();
        self.read("get_execution_summary", move |conn| {
            executions::summary_impl(conn, &execution_id)
        })
        .await
    }

    /// Row count for one of the store's tables (`leader_board`, `round_history`, ...).
    pub async fn count_rows(&self, table: &'static str) -> Result<i64, StoreError> {
        self.read("count_rows", move |conn| helpers::count_rows_impl(conn, table))
            .await
    }

    /// Run `f` inside an IMMEDIATE transaction on the blocking pool, retrying the whole
    /// transaction on failure.
    async fn write<T, F>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Fn(&Connection) -> Result<T, StoreError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        with_backoff(&self.retry, OpKind::Write, operation, || {
            let conn = Arc::clone(&self.conn);
            let f = Arc::clone(&f);
            run_blocking(move || {
                let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
                let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let out = f(&tx)?;
                tx.commit()?;
                Ok(out)
            })
        })
        .await
    }

    async fn read<T, F>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Fn(&Connection) -> Result<T, StoreError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        with_backoff(&self.retry, OpKind::Read, operation, || {
            let conn = Arc::clone(&self.conn);
            let f = Arc::clone(&f);
            run_blocking(move || {
                let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
                f(&guard)
            })
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/arena.db");
        let store = AggregationStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[tokio::test]
    async fn handles_use_separate_connections() {
        let dir = tempfile::tempdir().unwrap();
        let store = AggregationStore::open(dir.path().join("arena.db")).unwrap();
        let a = store.connect().unwrap();
        let b = store.connect().unwrap();
        assert!(!Arc::ptr_eq(&a.conn, &b.conn));
        assert_eq!(a.count_rows("leader_board").await.unwrap(), 0);
        assert_eq!(b.count_rows("round_status").await.unwrap(), 0);
    }
}
