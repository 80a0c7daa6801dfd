use crate::model::{ExecutionSummary, LeaderBoardEntry, RoundHistoryEntry, RoundStatusRecord};
use crate::storage::StoreError;

pub(crate) fn key_impl(execution_id: &str, team_id: &str, round_number: u32) -> Result<(), StoreError> {
    ids_impl(execution_id, team_id)?;
    if round_number == 0 {
        return Err(StoreError::validation("round_number must be >= 1"));
    }
    Ok(())
}

pub(crate) fn ids_impl(execution_id: &str, team_id: &str) -> Result<(), StoreError> {
    if execution_id.trim().is_empty() {
        return Err(StoreError::validation("execution_id must not be empty"));
    }
    if team_id.trim().is_empty() {
        return Err(StoreError::validation("team_id must not be empty"));
    }
    Ok(())
}

pub(crate) fn score_impl(field: &str, score: f64) -> Result<(), StoreError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(StoreError::validation(format!(
            "{field} must be within [0, 100], got {score}"
        )));
    }
    Ok(())
}

pub(crate) fn leader_board_entry_impl(e: &LeaderBoardEntry) -> Result<(), StoreError> {
    key_impl(&e.execution_id, &e.team_id, e.round_number)?;
    score_impl("score", e.score)?;
    for m in &e.score_details.metrics {
        score_impl(&format!("metric '{}' score", m.name), m.score)?;
    }
    if i64::try_from(e.token_usage).is_err() {
        return Err(StoreError::validation("token_usage exceeds storable range"));
    }
    Ok(())
}

pub(crate) fn history_entry_impl(e: &RoundHistoryEntry) -> Result<(), StoreError> {
    key_impl(&e.execution_id, &e.team_id, e.round_number)
}

pub(crate) fn round_status_impl(r: &RoundStatusRecord) -> Result<(), StoreError> {
    key_impl(&r.execution_id, &r.team_id, r.round_number)?;
    if let Some(c) = r.confidence_score {
        if !c.is_finite() || !(0.0..=1.0).contains(&c) {
            return Err(StoreError::validation(format!(
                "confidence_score must be within [0, 1], got {c}"
            )));
        }
    }
    if let Some(end) = r.round_ended_at {
        if end < r.round_started_at {
            return Err(StoreError::validation(
                "round_ended_at precedes round_started_at",
            ));
        }
    }
    Ok(())
}

pub(crate) fn execution_summary_impl(s: &ExecutionSummary) -> Result<(), StoreError> {
    if s.execution_id.trim().is_empty() {
        return Err(StoreError::validation("execution_id must not be empty"));
    }
    if let Some(best) = s.best_score {
        score_impl("best_score", best)?;
    }
    let secs = s.total_execution_time_seconds;
    if !secs.is_finite() || secs < 0.0 {
        return Err(StoreError::validation(format!(
            "total_execution_time_seconds must be non-negative, got {secs}"
        )));
    }
    Ok(())
}
