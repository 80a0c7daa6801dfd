use crate::storage::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Coarse error taxonomy used by callers to decide what to record and whether to continue
/// with other teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed team or evaluator configuration; surfaced before any round runs.
    Configuration,
    /// Bad input to a single call (out-of-range score, bad metric output). Never retried.
    Validation,
    /// Storage failure that was retried with backoff and still failed.
    TransientStorage,
    /// Submitter, evaluator or judgment failure (including timeouts).
    Execution,
    /// Progress-sink or callback failure. Logged and ignored inside the core.
    BestEffort,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config error: {field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("config error: {field} must be at least 1")]
    ZeroRounds { field: &'static str },

    #[error("config error: min_rounds ({min}) exceeds max_rounds ({max})")]
    RoundBounds { min: u32, max: u32 },

    #[error("config error: {field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("config error: evaluator has no metrics")]
    NoMetrics,

    #[error("config error: duplicate metric name '{name}'")]
    DuplicateMetric { name: String },

    #[error("config error: metric weights are all-or-nothing; unset for: {}", unset.join(", "))]
    PartialWeights { unset: Vec<String> },

    #[error("config error: metric '{name}' has invalid weight {weight}")]
    InvalidWeight { name: String, weight: f64 },

    #[error("config error: metric weights sum to {sum:.4}, expected 1.0 (±0.001)")]
    WeightSum { sum: f64 },

    #[error("config error: metric '{name}': {reason}")]
    InvalidMetric { name: String, reason: String },

    #[error("config error: failed to parse yaml: {0}")]
    Parse(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Which collaborator call a round was waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submit,
    Evaluate,
    Judge,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Submit => "submitter",
            Stage::Evaluate => "evaluator",
            Stage::Judge => "judge",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a team's round loop. Nothing here is retried by the controller.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("submitter failed in round {round}: {cause:#}")]
    Submitter { round: u32, cause: anyhow::Error },

    #[error("evaluator failed in round {round}: {cause:#}")]
    Evaluator { round: u32, cause: anyhow::Error },

    #[error("judgment failed in round {round}: {cause:#}")]
    Judgment { round: u32, cause: anyhow::Error },

    #[error("{stage} timed out after {}s in round {round}", timeout.as_secs_f64())]
    Timeout {
        stage: Stage,
        round: u32,
        timeout: Duration,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Controller state reached without the round it depends on.
    #[error("round loop invariant violated: {0}")]
    Invariant(&'static str),
}

impl RoundError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RoundError::Config(_) => ErrorClass::Configuration,
            RoundError::Evaluator { cause, .. }
                if cause
                    .downcast_ref::<crate::evaluator::InvalidScore>()
                    .is_some() =>
            {
                ErrorClass::Validation
            }
            RoundError::Submitter { .. }
            | RoundError::Evaluator { .. }
            | RoundError::Judgment { .. }
            | RoundError::Timeout { .. }
            | RoundError::Invariant(_) => ErrorClass::Execution,
            RoundError::Store(e) => e.class(),
        }
    }

    pub fn round(&self) -> Option<u32> {
        match self {
            RoundError::Submitter { round, .. }
            | RoundError::Evaluator { round, .. }
            | RoundError::Judgment { round, .. }
            | RoundError::Timeout { round, .. } => Some(*round),
            RoundError::Config(_) | RoundError::Store(_) | RoundError::Invariant(_) => None,
        }
    }
}
