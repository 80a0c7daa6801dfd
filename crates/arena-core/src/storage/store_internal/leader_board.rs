//! `leader_board` writes, ranking queries and row mapping.

use super::helpers::{parse_json_impl, parse_opt_ts_impl, u64_from_sql};
use crate::model::{LeaderBoardEntry, TeamRanking, TeamStatistics};
use crate::storage::StoreError;
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_COLUMNS: &str = "execution_id, team_id, round_number, submission_content,
    submission_format, score, score_details_json, token_usage, final_submission, exit_reason,
    created_at, updated_at";

pub(crate) fn upsert_entry_impl(
    conn: &Connection,
    e: &LeaderBoardEntry,
    now: &str,
) -> Result<(), StoreError> {
    let details = serde_json::to_string(&e.score_details)?;
    conn.execute(
        "INSERT INTO leader_board (
            execution_id, team_id, round_number, submission_content, submission_format,
            score, score_details_json, token_usage, final_submission, exit_reason,
            created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
         ON CONFLICT(execution_id, team_id, round_number) DO UPDATE SET
            submission_content = excluded.submission_content,
            submission_format  = excluded.submission_format,
            score              = excluded.score,
            score_details_json = excluded.score_details_json,
            token_usage        = excluded.token_usage,
            final_submission   = excluded.final_submission,
            exit_reason        = excluded.exit_reason,
            updated_at         = excluded.updated_at",
        params![
            e.execution_id,
            e.team_id,
            e.round_number,
            e.submission_content,
            e.submission_format,
            e.score,
            details,
            e.token_usage as i64,
            e.final_submission,
            e.exit_reason,
            now,
        ],
    )?;
    Ok(())
}

/// Flag exactly one row as the team's final submission within the execution.
pub(crate) fn mark_final_impl(
    conn: &Connection,
    execution_id: &str,
    team_id: &str,
    round_number: u32,
    exit_reason: &str,
    now: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE leader_board
            SET final_submission = 0, exit_reason = NULL, updated_at = ?4
          WHERE execution_id = ?1 AND team_id = ?2 AND round_number <> ?3
            AND final_submission = 1",
        params![execution_id, team_id, round_number, now],
    )?;
    let updated = conn.execute(
        "UPDATE leader_board
            SET final_submission = 1, exit_reason = ?4, updated_at = ?5
          WHERE execution_id = ?1 AND team_id = ?2 AND round_number = ?3",
        params![execution_id, team_id, round_number, exit_reason, now],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound(format!(
            "leader_board row {execution_id}/{team_id}/round {round_number}"
        )));
    }
    Ok(())
}

pub(crate) fn row_to_entry_impl(row: &rusqlite::Row<'_>) -> rusqlite::Result<LeaderBoardEntry> {
    let details: String = row.get(6)?;
    Ok(LeaderBoardEntry {
        execution_id: row.get(0)?,
        team_id: row.get(1)?,
        round_number: row.get(2)?,
        submission_content: row.get(3)?,
        submission_format: row.get(4)?,
        score: row.get(5)?,
        score_details: parse_json_impl(6, &details)?,
        token_usage: u64_from_sql(7, row.get(7)?)?,
        final_submission: row.get(8)?,
        exit_reason: row.get(9)?,
        created_at: parse_opt_ts_impl(10, row.get(10)?)?,
        updated_at: parse_opt_ts_impl(11, row.get(11)?)?,
    })
}

/// Global board across executions. Equal scores keep insertion order.
pub(crate) fn top_entries_impl(
    conn: &Connection,
    limit: u32,
) -> Result<Vec<LeaderBoardEntry>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM leader_board
          ORDER BY score DESC, created_at ASC, id ASC
          LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map(params![limit], row_to_entry_impl)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn execution_entries_impl(
    conn: &Connection,
    execution_id: &str,
    limit: u32,
) -> Result<Vec<LeaderBoardEntry>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM leader_board
          WHERE execution_id = ?1
          ORDER BY score DESC, created_at ASC, id ASC
          LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(params![execution_id, limit], row_to_entry_impl)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One row per team: best score within the execution, ties broken by team id.
pub(crate) fn ranking_impl(
    conn: &Connection,
    execution_id: &str,
) -> Result<Vec<TeamRanking>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT team_id, MAX(score) AS best, COUNT(*) AS rounds
           FROM leader_board
          WHERE execution_id = ?1
          GROUP BY team_id
          ORDER BY best DESC, team_id ASC",
    )?;
    let rows = stmt
        .query_map(params![execution_id], |row| {
            Ok(TeamRanking {
                team_id: row.get(0)?,
                best_score: row.get(1)?,
                rounds: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Aggregate over every execution the team appears in.
pub(crate) fn team_statistics_impl(
    conn: &Connection,
    team_id: &str,
) -> Result<TeamStatistics, StoreError> {
    let stats = conn.query_row(
        "SELECT COUNT(*), AVG(score), MAX(score), COALESCE(SUM(token_usage), 0)
           FROM leader_board
          WHERE team_id = ?1",
        params![team_id],
        |row| {
            Ok(TeamStatistics {
                team_id: team_id.to_string(),
                total_rounds: u64_from_sql(0, row.get(0)?)?,
                average_score: row.get(1)?,
                best_score: row.get(2)?,
                total_tokens: u64_from_sql(3, row.get(3)?)?,
            })
        },
    )?;
    Ok(stats)
}

pub(crate) fn final_submission_impl(
    conn: &Connection,
    execution_id: &str,
    team_id: &str,
) -> Result<Option<LeaderBoardEntry>, StoreError> {
    let entry = conn
        .query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM leader_board
                  WHERE execution_id = ?1 AND team_id = ?2 AND final_submission = 1"
            ),
            params![execution_id, team_id],
            row_to_entry_impl,
        )
        .optional()?;
    Ok(entry)
}
