use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Categorical cause of a team's round loop terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    MaxRoundsReached,
    NoImprovementExpected,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::MaxRoundsReached => "max_rounds_reached",
            ExitReason::NoImprovementExpected => "no_improvement_expected",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementJudgment {
    pub should_continue: bool,
    pub reasoning: String,
    /// In [0, 1].
    pub confidence_score: f64,
}

impl ImprovementJudgment {
    pub fn below_minimum_rounds() -> Self {
        Self {
            should_continue: true,
            reasoning: "below minimum rounds".to_string(),
            confidence_score: 1.0,
        }
    }
}

/// One metric's contribution to an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub name: String,
    /// In [0, 100].
    pub score: f64,
    pub comment: String,
    /// Resolved weight; `None` when the score did not come from a weighted evaluator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Weighted average of `metrics`, in [0, 100].
    pub overall_score: f64,
    pub metrics: Vec<MetricScore>,
}

/// In-memory record of one completed round. Owned by the controller for the lifetime
/// of the run; only `improvement_judgment` is attached after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub round_number: u32,
    pub submission_content: String,
    pub evaluation_score: f64,
    pub score_details: EvaluationResult,
    pub improvement_judgment: Option<ImprovementJudgment>,
    pub round_started_at: DateTime<Utc>,
    pub round_ended_at: DateTime<Utc>,
}

/// Raw submission and conversation history (`round_history` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundHistoryEntry {
    pub execution_id: String,
    pub team_id: String,
    pub round_number: u32,
    pub submission_content: String,
    pub messages: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `leader_board` row. `created_at`/`updated_at` are store-assigned and ignored on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderBoardEntry {
    pub execution_id: String,
    pub team_id: String,
    pub round_number: u32,
    pub submission_content: String,
    pub submission_format: String,
    pub score: f64,
    pub score_details: EvaluationResult,
    #[serde(default)]
    pub token_usage: u64,
    pub final_submission: bool,
    pub exit_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `round_status` row: continuation decision plus timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStatusRecord {
    pub execution_id: String,
    pub team_id: String,
    pub round_number: u32,
    /// `None` while the judgment is pending.
    pub should_continue: Option<bool>,
    pub reasoning: Option<String>,
    pub confidence_score: Option<f64>,
    pub round_started_at: DateTime<Utc>,
    pub round_ended_at: Option<DateTime<Utc>>,
}

/// One team's best score within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRanking {
    pub team_id: String,
    pub best_score: f64,
    pub rounds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub team_id: String,
    pub total_rounds: u64,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    PartialFailure,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::PartialFailure => "partial_failure",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(ExecutionStatus::Completed),
            "partial_failure" => Some(ExecutionStatus::PartialFailure),
            "failed" => Some(ExecutionStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRunStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamResult {
    pub team_id: String,
    pub team_name: String,
    pub status: TeamRunStatus,
    pub best_score: Option<f64>,
    pub best_round: Option<u32>,
    pub total_rounds: u32,
    pub exit_reason: Option<String>,
    pub error: Option<String>,
}

impl TeamResult {
    pub fn completed(
        team_id: impl Into<String>,
        team_name: impl Into<String>,
        outcome: &crate::engine::RoundOutcome,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
            status: TeamRunStatus::Completed,
            best_score: Some(outcome.best.evaluation_score),
            best_round: Some(outcome.best.round_number),
            total_rounds: outcome.rounds.len() as u32,
            exit_reason: Some(outcome.exit_reason.as_str().to_string()),
            error: None,
        }
    }

    pub fn failed(
        team_id: impl Into<String>,
        team_name: impl Into<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
            status: TeamRunStatus::Failed,
            best_score: None,
            best_round: None,
            total_rounds: 0,
            exit_reason: None,
            error: Some(error.to_string()),
        }
    }
}

/// Cross-team final outcome, keyed by `execution_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub team_results: Vec<TeamResult>,
    pub total_teams: u32,
    pub best_team_id: Option<String>,
    pub best_score: Option<f64>,
    pub total_execution_time_seconds: f64,
}

impl ExecutionSummary {
    pub fn from_team_results(
        execution_id: impl Into<String>,
        team_results: Vec<TeamResult>,
        elapsed: Duration,
    ) -> Self {
        let completed = team_results
            .iter()
            .filter(|t| t.status == TeamRunStatus::Completed)
            .count();
        let status = if !team_results.is_empty() && completed == team_results.len() {
            ExecutionStatus::Completed
        } else if completed == 0 {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::PartialFailure
        };

        let best = team_results
            .iter()
            .filter(|t| t.status == TeamRunStatus::Completed)
            .filter_map(|t| t.best_score.map(|s| (t, s)))
            .max_by(|(a, sa), (b, sb)| sa.total_cmp(sb).then_with(|| b.team_id.cmp(&a.team_id)));

        Self {
            execution_id: execution_id.into(),
            status,
            total_teams: team_results.len() as u32,
            best_team_id: best.map(|(t, _)| t.team_id.clone()),
            best_score: best.map(|(_, s)| s),
            total_execution_time_seconds: elapsed.as_secs_f64(),
            team_results,
        }
    }
}

pub fn new_execution_id() -> String {
    format!("exec-{}", uuid::Uuid::new_v4())
}
