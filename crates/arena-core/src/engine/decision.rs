//! Three-stage continuation rule: minimum-rounds floor, judge verdict, maximum-rounds
//! ceiling, applied in that order.

use crate::config::RoundSettings;
use crate::model::{ExitReason, ImprovementJudgment};

pub const CEILING_SUFFIX: &str = " [stopped: max rounds reached]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Round is below `min_rounds`; continue without asking the judge.
    BelowMinimum,
    /// Floor cleared; the judge decides, subject to the ceiling.
    Judge,
}

pub fn gate(round: u32, settings: &RoundSettings) -> Gate {
    if round < settings.min_rounds {
        Gate::BelowMinimum
    } else {
        Gate::Judge
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationDecision {
    pub judgment: ImprovementJudgment,
    /// `Some` when the loop stops after this round.
    pub exit_reason: Option<ExitReason>,
}

impl ContinuationDecision {
    pub fn below_minimum() -> Self {
        Self {
            judgment: ImprovementJudgment::below_minimum_rounds(),
            exit_reason: None,
        }
    }
}

/// Apply the ceiling to a judge verdict.
pub fn apply_verdict(
    round: u32,
    settings: &RoundSettings,
    mut judgment: ImprovementJudgment,
) -> ContinuationDecision {
    if round >= settings.max_rounds {
        if judgment.should_continue {
            judgment.should_continue = false;
            judgment.reasoning.push_str(CEILING_SUFFIX);
        }
        return ContinuationDecision {
            judgment,
            exit_reason: Some(ExitReason::MaxRoundsReached),
        };
    }

    let exit_reason = (!judgment.should_continue).then_some(ExitReason::NoImprovementExpected);
    ContinuationDecision {
        judgment,
        exit_reason,
    }
}
