use super::helpers::{conversion_error, parse_json_impl};
use crate::model::{ExecutionStatus, ExecutionSummary};
use crate::storage::StoreError;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, thiserror::Error)]
#[error("unknown execution status '{0}'")]
struct UnknownStatus(String);

pub(crate) fn upsert_summary_impl(
    conn: &Connection,
    s: &ExecutionSummary,
    now: &str,
) -> Result<(), StoreError> {
    let team_results = serde_json::to_string(&s.team_results)?;
    conn.execute(
        "INSERT INTO execution_summary (
            execution_id, status, team_results_json, total_teams, best_team_id, best_score,
            total_execution_time_seconds, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
         ON CONFLICT(execution_id) DO UPDATE SET
            status                       = excluded.status,
            team_results_json            = excluded.team_results_json,
            total_teams                  = excluded.total_teams,
            best_team_id                 = excluded.best_team_id,
            best_score                   = excluded.best_score,
            total_execution_time_seconds = excluded.total_execution_time_seconds,
            updated_at                   = excluded.updated_at",
        params![
            s.execution_id,
            s.status.as_str(),
            team_results,
            s.total_teams,
            s.best_team_id,
            s.best_score,
            s.total_execution_time_seconds,
            now,
        ],
    )?;
    Ok(())
}

pub(crate) fn summary_impl(
    conn: &Connection,
    execution_id: &str,
) -> Result<Option<ExecutionSummary>, StoreError> {
    let summary = conn
        .query_row(
            "SELECT execution_id, status, team_results_json, total_teams, best_team_id,
                    best_score, total_execution_time_seconds
               FROM execution_summary
              WHERE execution_id = ?1",
            params![execution_id],
            |row| {
                let status: String = row.get(1)?;
                let team_results: String = row.get(2)?;
                Ok(ExecutionSummary {
                    execution_id: row.get(0)?,
                    status: ExecutionStatus::parse(&status)
                        .ok_or_else(|| conversion_error(1, Type::Text, UnknownStatus(status)))?,
                    team_results: parse_json_impl(2, &team_results)?,
                    total_teams: row.get(3)?,
                    best_team_id: row.get(4)?,
                    best_score: row.get(5)?,
                    total_execution_time_seconds: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(summary)
}
