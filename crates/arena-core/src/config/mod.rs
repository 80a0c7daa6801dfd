//! Run configuration types.
//!
//! Everything here arrives already resolved: file discovery and CLI/env precedence
//! belong to the caller. What this module owns is the shape of the settings and the
//! checks that must pass before the first round starts.

pub mod resolve;

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

pub use resolve::{resolve_judge_settings, resolve_override, ResolvedJudgeSettings};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoundSettings {
    /// Rounds that always run regardless of the judgment verdict.
    pub min_rounds: u32,
    /// Hard ceiling; the loop never runs past this round.
    pub max_rounds: u32,
    pub submit_timeout_secs: u64,
    pub evaluate_timeout_secs: u64,
    pub judge_timeout_secs: u64,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            min_rounds: 1,
            max_rounds: 5,
            submit_timeout_secs: 600,
            evaluate_timeout_secs: 300,
            judge_timeout_secs: 120,
        }
    }
}

impl RoundSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_rounds == 0 {
            return Err(ConfigError::ZeroRounds {
                field: "min_rounds",
            });
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroRounds {
                field: "max_rounds",
            });
        }
        if self.min_rounds > self.max_rounds {
            return Err(ConfigError::RoundBounds {
                min: self.min_rounds,
                max: self.max_rounds,
            });
        }
        for (field, secs) in [
            ("submit_timeout_secs", self.submit_timeout_secs),
            ("evaluate_timeout_secs", self.evaluate_timeout_secs),
            ("judge_timeout_secs", self.judge_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ZeroTimeout { field });
            }
        }
        Ok(())
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn evaluate_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluate_timeout_secs)
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_secs(self.judge_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamSpec {
    pub team_id: String,
    pub team_name: String,
    #[serde(default = "default_submission_format")]
    pub submission_format: String,
}

fn default_submission_format() -> String {
    "text".to_string()
}

impl TeamSpec {
    pub fn new(team_id: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
            submission_format: default_submission_format(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_id.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "team_id" });
        }
        if self.team_name.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "team_name" });
        }
        Ok(())
    }
}

/// Optional judge model settings. Used both as evaluator-wide defaults and as
/// per-metric overrides; see [`resolve::resolve_judge_settings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JudgeSettings {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricKind {
    LlmJudge {
        criteria: String,
    },
    MustContain {
        terms: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
    RegexMatch {
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    Length {
        #[serde(default)]
        min_words: Option<u32>,
        #[serde(default)]
        max_words: Option<u32>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricConfig {
    pub name: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(flatten)]
    pub kind: MetricKind,
    #[serde(default)]
    pub judge: JudgeSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluatorConfig {
    #[serde(default)]
    pub defaults: JudgeSettings,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

impl EvaluatorConfig {
    /// Structural checks plus weight resolution. Weight errors are reported here so a
    /// bad configuration never reaches round 1.
    pub fn validate(&self) -> Result<Vec<f64>, ConfigError> {
        let mut seen = HashSet::new();
        for m in &self.metrics {
            if m.name.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    field: "metrics[].name",
                });
            }
            if !seen.insert(m.name.as_str()) {
                return Err(ConfigError::DuplicateMetric {
                    name: m.name.clone(),
                });
            }
            if let MetricKind::Length {
                min_words: Some(lo),
                max_words: Some(hi),
            } = &m.kind
            {
                if lo > hi {
                    return Err(ConfigError::InvalidMetric {
                        name: m.name.clone(),
                        reason: format!("min_words ({}) exceeds max_words ({})", lo, hi),
                    });
                }
            }
        }
        let named: Vec<(String, Option<f64>)> = self
            .metrics
            .iter()
            .map(|m| (m.name.clone(), m.weight))
            .collect();
        crate::evaluator::resolve_weights(&named)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArenaConfig {
    #[serde(default)]
    pub rounds: RoundSettings,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

impl ArenaConfig {
    /// Parse an already-loaded YAML document and validate it.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: ArenaConfig = serde_yaml::from_str(raw)?;
        cfg.rounds.validate()?;
        cfg.evaluator.validate()?;
        Ok(cfg)
    }
}
