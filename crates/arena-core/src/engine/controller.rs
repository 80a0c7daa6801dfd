//! Per-team round loop.
//!
//! Rounds run strictly in order, 1..=max_rounds. Each round submits, persists the raw
//! submission, scores, records a pending status, decides whether to continue and
//! records the decision. Collaborator failures abort the loop; only progress reporting
//! and the round-complete callback are allowed to fail quietly.

use super::decision::{self, ContinuationDecision, Gate};
use super::{finalize, prompt};
use crate::config::{RoundSettings, TeamSpec};
use crate::errors::{ConfigError, RoundError, Stage};
use crate::evaluator::Evaluator;
use crate::judge::JudgmentClient;
use crate::model::{
    EvaluationResult, ExitReason, LeaderBoardEntry, RoundHistoryEntry, RoundState,
    RoundStatusRecord, TeamRanking,
};
use crate::report::progress::{self, NoopProgressSink, ProgressSink, ProgressStatus, ProgressUpdate};
use crate::storage::StoreHandle;
use crate::submitter::{SubmissionContext, Submitter};
use chrono::Utc;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Called after each completed round. Errors and panics are logged and ignored.
pub type RoundCallback = Arc<dyn Fn(&RoundState) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running(u32),
    Judging(u32),
    Terminated(ExitReason),
}

/// Identity of one team's run within an execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub execution_id: String,
    pub user_query: String,
    pub team: TeamSpec,
}

impl RunContext {
    pub fn new(execution_id: impl Into<String>, user_query: impl Into<String>, team: TeamSpec) -> Self {
        Self {
            execution_id: execution_id.into(),
            user_query: user_query.into(),
            team,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    /// Finalized round: highest score, later round on ties.
    pub best: RoundState,
    pub exit_reason: ExitReason,
    /// Every round in order, judgments attached.
    pub rounds: Vec<RoundState>,
}

pub struct RoundController {
    ctx: RunContext,
    settings: RoundSettings,
    submitter: Arc<dyn Submitter>,
    evaluator: Arc<dyn Evaluator>,
    judge: Arc<dyn JudgmentClient>,
    store: StoreHandle,
    progress: Arc<dyn ProgressSink>,
    on_round_complete: Option<RoundCallback>,
}

impl RoundController {
    /// Validates the team and round settings; nothing runs until [`RoundController::run`].
    pub fn new(
        ctx: RunContext,
        settings: RoundSettings,
        submitter: Arc<dyn Submitter>,
        evaluator: Arc<dyn Evaluator>,
        judge: Arc<dyn JudgmentClient>,
        store: StoreHandle,
    ) -> Result<Self, ConfigError> {
        if ctx.execution_id.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "execution_id",
            });
        }
        ctx.team.validate()?;
        settings.validate()?;
        Ok(Self {
            ctx,
            settings,
            submitter,
            evaluator,
            judge,
            store,
            progress: Arc::new(NoopProgressSink),
            on_round_complete: None,
        })
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn on_round_complete(mut self, callback: RoundCallback) -> Self {
        self.on_round_complete = Some(callback);
        self
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    pub async fn run(&self) -> Result<RoundOutcome, RoundError> {
        let span = tracing::info_span!(
            "arena.team",
            execution_id = %self.ctx.execution_id,
            team_id = %self.ctx.team.team_id,
        );
        async {
            let mut current_round = 0;
            match self.run_rounds(&mut current_round).await {
                Ok(outcome) => {
                    self.report(
                        ProgressStatus::Completed,
                        outcome.rounds.len() as u32,
                        "",
                        None,
                    )
                    .await;
                    Ok(outcome)
                }
                Err(e) => {
                    tracing::error!(round = ?e.round(), error = %e, "team run failed");
                    self.report(
                        ProgressStatus::Failed,
                        e.round().unwrap_or(current_round),
                        "",
                        Some(e.to_string()),
                    )
                    .await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// `current_round` tracks the round in flight so failures without a round of their
    /// own (store errors) can still be reported against it.
    async fn run_rounds(&self, current_round: &mut u32) -> Result<RoundOutcome, RoundError> {
        let mut rounds: Vec<RoundState> = Vec::new();
        let mut state = ControllerState::Running(1);

        loop {
            tracing::trace!(?state, "controller state");
            state = match state {
                ControllerState::Running(n) => {
                    *current_round = n;
                    let round = self
                        .execute_round(n, &rounds)
                        .instrument(tracing::info_span!("arena.round", round = n))
                        .await?;
                    rounds.push(round);
                    ControllerState::Judging(n)
                }
                ControllerState::Judging(n) => {
                    let decision = self
                        .decide(n, &rounds)
                        .instrument(tracing::info_span!("arena.judge", round = n))
                        .await?;
                    debug_assert_eq!(rounds.len(), n as usize);
                    let Some(current) = rounds.last_mut() else {
                        return Err(RoundError::Invariant("judging without an executed round"));
                    };
                    current.improvement_judgment = Some(decision.judgment.clone());
                    self.store
                        .save_round_status(&self.status_record(current))
                        .await?;
                    self.invoke_callback(current);

                    match decision.exit_reason {
                        Some(reason) => ControllerState::Terminated(reason),
                        None if n >= self.settings.max_rounds => {
                            ControllerState::Terminated(ExitReason::MaxRoundsReached)
                        }
                        None => ControllerState::Running(n + 1),
                    }
                }
                ControllerState::Terminated(reason) => return self.finalize(rounds, reason).await,
            };
        }
    }

    async fn execute_round(&self, n: u32, prior: &[RoundState]) -> Result<RoundState, RoundError> {
        let team_id = self.ctx.team.team_id.as_str();
        self.report(ProgressStatus::Running, n, Stage::Submit.as_str(), None)
            .await;

        let ranking = if prior.is_empty() {
            Vec::new()
        } else {
            self.ranking().await?
        };
        let round_prompt = prompt::build_round_prompt(&self.ctx.user_query, team_id, prior, &ranking);

        let started = Utc::now();
        let sub_ctx = SubmissionContext {
            execution_id: self.ctx.execution_id.clone(),
            team_id: team_id.to_string(),
            round_number: n,
        };
        let submission = bounded(
            Stage::Submit,
            n,
            self.settings.submit_timeout(),
            self.submitter.submit(&round_prompt, &sub_ctx),
        )
        .await?;

        self.store
            .save_aggregation(&RoundHistoryEntry {
                execution_id: self.ctx.execution_id.clone(),
                team_id: team_id.to_string(),
                round_number: n,
                submission_content: submission.output.clone(),
                messages: submission.history.clone(),
                created_at: None,
            })
            .await?;

        self.report(ProgressStatus::Running, n, Stage::Evaluate.as_str(), None)
            .await;
        let evaluation: EvaluationResult = bounded(
            Stage::Evaluate,
            n,
            self.settings.evaluate_timeout(),
            self.evaluator
                .evaluate(&self.ctx.user_query, &submission.output, team_id),
        )
        .await?;
        let ended = Utc::now();

        self.store
            .save_to_leader_board(&LeaderBoardEntry {
                execution_id: self.ctx.execution_id.clone(),
                team_id: team_id.to_string(),
                round_number: n,
                submission_content: submission.output.clone(),
                submission_format: self.ctx.team.submission_format.clone(),
                score: evaluation.overall_score,
                score_details: evaluation.clone(),
                token_usage: submission.token_usage,
                final_submission: false,
                exit_reason: None,
                created_at: None,
                updated_at: None,
            })
            .await?;

        let round = RoundState {
            round_number: n,
            submission_content: submission.output,
            evaluation_score: evaluation.overall_score,
            score_details: evaluation,
            improvement_judgment: None,
            round_started_at: started,
            round_ended_at: ended,
        };
        self.store
            .save_round_status(&self.status_record(&round))
            .await?;

        tracing::info!(score = round.evaluation_score, "round scored");
        Ok(round)
    }

    async fn decide(&self, n: u32, rounds: &[RoundState]) -> Result<ContinuationDecision, RoundError> {
        if decision::gate(n, &self.settings) == Gate::BelowMinimum {
            tracing::debug!(min_rounds = self.settings.min_rounds, "below minimum rounds, continuing");
            return Ok(ContinuationDecision::below_minimum());
        }

        self.report(ProgressStatus::Running, n, Stage::Judge.as_str(), None)
            .await;
        let ranking = self.ranking().await?;
        let judgment_prompt = prompt::build_judgment_prompt(
            &self.ctx.user_query,
            &self.ctx.team.team_id,
            rounds,
            &ranking,
            self.settings.max_rounds,
        );
        let verdict = bounded(
            Stage::Judge,
            n,
            self.settings.judge_timeout(),
            self.judge.judge(&judgment_prompt),
        )
        .await?;

        let decision = decision::apply_verdict(n, &self.settings, verdict);
        tracing::info!(
            should_continue = decision.judgment.should_continue,
            confidence = decision.judgment.confidence_score,
            exit_reason = ?decision.exit_reason,
            "continuation decided"
        );
        Ok(decision)
    }

    async fn finalize(
        &self,
        rounds: Vec<RoundState>,
        exit_reason: ExitReason,
    ) -> Result<RoundOutcome, RoundError> {
        let best = finalize::select_best_round(&rounds)
            .cloned()
            .ok_or(RoundError::Invariant("finalizing without an executed round"))?;
        self.store
            .mark_final_submission(
                &self.ctx.execution_id,
                &self.ctx.team.team_id,
                best.round_number,
                exit_reason.as_str(),
            )
            .await?;

        tracing::info!(
            best_round = best.round_number,
            best_score = best.evaluation_score,
            rounds = rounds.len(),
            exit_reason = %exit_reason,
            "team run finalized"
        );
        Ok(RoundOutcome {
            best,
            exit_reason,
            rounds,
        })
    }

    async fn ranking(&self) -> Result<Vec<TeamRanking>, RoundError> {
        Ok(self
            .store
            .get_leader_board_ranking(&self.ctx.execution_id)
            .await?)
    }

    fn status_record(&self, round: &RoundState) -> RoundStatusRecord {
        let judgment = round.improvement_judgment.as_ref();
        RoundStatusRecord {
            execution_id: self.ctx.execution_id.clone(),
            team_id: self.ctx.team.team_id.clone(),
            round_number: round.round_number,
            should_continue: judgment.map(|j| j.should_continue),
            reasoning: judgment.map(|j| j.reasoning.clone()),
            confidence_score: judgment.map(|j| j.confidence_score),
            round_started_at: round.round_started_at,
            round_ended_at: Some(round.round_ended_at),
        }
    }

    fn invoke_callback(&self, round: &RoundState) {
        let Some(cb) = &self.on_round_complete else {
            return;
        };
        match std::panic::catch_unwind(AssertUnwindSafe(|| cb(round))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(round = round.round_number, error = %e, "round callback failed")
            }
            Err(_) => tracing::warn!(round = round.round_number, "round callback panicked"),
        }
    }

    async fn report(
        &self,
        status: ProgressStatus,
        current_round: u32,
        agent: &str,
        error_message: Option<String>,
    ) {
        progress::emit(
            self.progress.as_ref(),
            ProgressUpdate {
                execution_id: self.ctx.execution_id.clone(),
                status,
                current_round,
                total_rounds: self.settings.max_rounds,
                team_id: self.ctx.team.team_id.clone(),
                team_name: self.ctx.team.team_name.clone(),
                current_agent: agent.to_string(),
                updated_at: Utc::now(),
                error_message,
            },
        )
        .await;
    }
}

/// Await a collaborator call under `limit`, mapping failures to the stage's error.
async fn bounded<T>(
    stage: Stage,
    round: u32,
    limit: Duration,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, RoundError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(cause)) => Err(match stage {
            Stage::Submit => RoundError::Submitter { round, cause },
            Stage::Evaluate => RoundError::Evaluator { round, cause },
            Stage::Judge => RoundError::Judgment { round, cause },
        }),
        Err(_) => Err(RoundError::Timeout {
            stage,
            round,
            timeout: limit,
        }),
    }
}
