//! `round_history` and `round_status` read/write paths.

use super::helpers::{parse_json_impl, parse_opt_ts_impl, parse_ts_impl, ts_to_sql};
use crate::model::{RoundHistoryEntry, RoundStatusRecord};
use crate::storage::StoreError;
use rusqlite::{params, Connection, OptionalExtension};

pub(crate) fn upsert_history_impl(
    conn: &Connection,
    e: &RoundHistoryEntry,
    now: &str,
) -> Result<(), StoreError> {
    let messages = serde_json::to_string(&e.messages)?;
    conn.execute(
        "INSERT INTO round_history (
            execution_id, team_id, round_number, submission_content, messages_json,
            created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(execution_id, team_id, round_number) DO UPDATE SET
            submission_content = excluded.submission_content,
            messages_json      = excluded.messages_json,
            updated_at         = excluded.updated_at",
        params![
            e.execution_id,
            e.team_id,
            e.round_number,
            e.submission_content,
            messages,
            now,
        ],
    )?;
    Ok(())
}

pub(crate) fn history_impl(
    conn: &Connection,
    execution_id: &str,
    team_id: &str,
) -> Result<Vec<RoundHistoryEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT execution_id, team_id, round_number, submission_content, messages_json, created_at
           FROM round_history
          WHERE execution_id = ?1 AND team_id = ?2
          ORDER BY round_number ASC",
    )?;
    let rows = stmt
        .query_map(params![execution_id, team_id], |row| {
            let messages: String = row.get(4)?;
            Ok(RoundHistoryEntry {
                execution_id: row.get(0)?,
                team_id: row.get(1)?,
                round_number: row.get(2)?,
                submission_content: row.get(3)?,
                messages: parse_json_impl(4, &messages)?,
                created_at: parse_opt_ts_impl(5, row.get(5)?)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn upsert_status_impl(
    conn: &Connection,
    r: &RoundStatusRecord,
    now: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO round_status (
            execution_id, team_id, round_number, should_continue, reasoning, confidence_score,
            round_started_at, round_ended_at, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
         ON CONFLICT(execution_id, team_id, round_number) DO UPDATE SET
            should_continue  = excluded.should_continue,
            reasoning        = excluded.reasoning,
            confidence_score = excluded.confidence_score,
            round_started_at = excluded.round_started_at,
            round_ended_at   = excluded.round_ended_at,
            updated_at       = excluded.updated_at",
        params![
            r.execution_id,
            r.team_id,
            r.round_number,
            r.should_continue,
            r.reasoning,
            r.confidence_score,
            ts_to_sql(&r.round_started_at),
            r.round_ended_at.as_ref().map(ts_to_sql),
            now,
        ],
    )?;
    Ok(())
}

pub(crate) fn status_impl(
    conn: &Connection,
    execution_id: &str,
    team_id: &str,
    round_number: u32,
) -> Result<Option<RoundStatusRecord>, StoreError> {
    let record = conn
        .query_row(
            "SELECT execution_id, team_id, round_number, should_continue, reasoning,
                    confidence_score, round_started_at, round_ended_at
               FROM round_status
              WHERE execution_id = ?1 AND team_id = ?2 AND round_number = ?3",
            params![execution_id, team_id, round_number],
            |row| {
                let started: String = row.get(6)?;
                Ok(RoundStatusRecord {
                    execution_id: row.get(0)?,
                    team_id: row.get(1)?,
                    round_number: row.get(2)?,
                    should_continue: row.get(3)?,
                    reasoning: row.get(4)?,
                    confidence_score: row.get(5)?,
                    round_started_at: parse_ts_impl(6, &started)?,
                    round_ended_at: parse_opt_ts_impl(7, row.get(7)?)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}
