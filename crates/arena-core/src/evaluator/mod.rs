//! Weighted multi-metric scoring.

pub mod llm_metric;

use crate::errors::ConfigError;
use crate::metrics_api::{Metric, MetricInput};
use crate::model::{EvaluationResult, MetricScore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

pub use llm_metric::LlmJudgeMetric;

/// Allowed distance between the configured weight sum and 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        user_query: &str,
        submission: &str,
        team_id: &str,
    ) -> anyhow::Result<EvaluationResult>;
}

/// A metric produced a score outside [0, 100].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("metric '{metric}' returned score {score} outside [0, 100]")]
pub struct InvalidScore {
    pub metric: String,
    pub score: f64,
}

/// Resolve per-metric weights.
///
/// All unset: equal split. Mixed: error naming the unset metrics. Configured weights
/// must be finite, non-negative and sum to 1.0 within [`WEIGHT_SUM_TOLERANCE`].
pub fn resolve_weights(metrics: &[(String, Option<f64>)]) -> Result<Vec<f64>, ConfigError> {
    if metrics.is_empty() {
        return Err(ConfigError::NoMetrics);
    }
    let mut seen = HashSet::new();
    for (name, _) in metrics {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateMetric { name: name.clone() });
        }
    }

    let unset: Vec<String> = metrics
        .iter()
        .filter(|(_, w)| w.is_none())
        .map(|(n, _)| n.clone())
        .collect();
    if unset.len() == metrics.len() {
        let w = 1.0 / metrics.len() as f64;
        return Ok(vec![w; metrics.len()]);
    }
    if !unset.is_empty() {
        return Err(ConfigError::PartialWeights { unset });
    }

    let mut weights = Vec::with_capacity(metrics.len());
    for (name, w) in metrics {
        let w = w.unwrap_or_default();
        if !w.is_finite() || w < 0.0 {
            return Err(ConfigError::InvalidWeight {
                name: name.clone(),
                weight: w,
            });
        }
        weights.push(w);
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightSum { sum });
    }
    Ok(weights)
}

pub struct WeightedMetric {
    pub metric: Arc<dyn Metric>,
    pub weight: Option<f64>,
}

impl WeightedMetric {
    pub fn new(metric: Arc<dyn Metric>, weight: Option<f64>) -> Self {
        Self { metric, weight }
    }
}

/// Evaluator over a fixed set of metrics with weights resolved at construction.
pub struct WeightedEvaluator {
    metrics: Vec<(Arc<dyn Metric>, f64)>,
}

impl std::fmt::Debug for WeightedEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedEvaluator")
            .field(
                "metrics",
                &self
                    .metrics
                    .iter()
                    .map(|(m, w)| (m.name().to_string(), *w))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl WeightedEvaluator {
    pub fn new(metrics: Vec<WeightedMetric>) -> Result<Self, ConfigError> {
        let named: Vec<(String, Option<f64>)> = metrics
            .iter()
            .map(|m| (m.metric.name().to_string(), m.weight))
            .collect();
        let weights = resolve_weights(&named)?;
        Ok(Self {
            metrics: metrics
                .into_iter()
                .zip(weights)
                .map(|(m, w)| (m.metric, w))
                .collect(),
        })
    }

    pub fn weights(&self) -> Vec<(&str, f64)> {
        self.metrics.iter().map(|(m, w)| (m.name(), *w)).collect()
    }
}

#[async_trait]
impl Evaluator for WeightedEvaluator {
    async fn evaluate(
        &self,
        user_query: &str,
        submission: &str,
        team_id: &str,
    ) -> anyhow::Result<EvaluationResult> {
        let input = MetricInput {
            user_query,
            submission,
            team_id,
        };

        let mut scores = Vec::with_capacity(self.metrics.len());
        let mut overall = 0.0;
        for (metric, weight) in &self.metrics {
            let name = metric.name();
            let value = metric.evaluate(&input).await.map_err(|e| {
                e.context(format!("metric '{}' failed for team {}", name, team_id))
            })?;
            if !value.score.is_finite() || !(0.0..=100.0).contains(&value.score) {
                return Err(InvalidScore {
                    metric: name.to_string(),
                    score: value.score,
                }
                .into());
            }
            tracing::debug!(metric = name, score = value.score, weight, "metric scored");
            overall += weight * value.score;
            scores.push(MetricScore {
                name: name.to_string(),
                score: value.score,
                comment: value.comment,
                weight: Some(*weight),
            });
        }

        Ok(EvaluationResult {
            overall_score: overall.clamp(0.0, 100.0),
            metrics: scores,
        })
    }
}
