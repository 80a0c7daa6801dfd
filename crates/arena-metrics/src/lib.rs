//! Rule-based metrics and the factory that turns an [`EvaluatorConfig`] into a
//! ready-to-run [`WeightedEvaluator`].

use std::sync::Arc;

use arena_core::config::{resolve_judge_settings, EvaluatorConfig, MetricKind};
use arena_core::evaluator::{LlmJudgeMetric, WeightedEvaluator, WeightedMetric};
use arena_core::metrics_api::Metric;
use arena_core::providers::llm::ClientCache;
use arena_core::ConfigError;

pub mod length;
pub mod must_contain;
pub mod regex_match;

pub use length::LengthMetric;
pub use must_contain::MustContainMetric;
pub use regex_match::RegexMatchMetric;

/// Build every configured metric and resolve weights. LLM-backed metrics share clients
/// through `clients`, keyed by their resolved judge settings.
pub fn build_evaluator(
    config: &EvaluatorConfig,
    clients: &ClientCache,
) -> Result<WeightedEvaluator, ConfigError> {
    config.validate()?;

    let mut metrics = Vec::with_capacity(config.metrics.len());
    for m in &config.metrics {
        let metric: Arc<dyn Metric> = match &m.kind {
            MetricKind::LlmJudge { criteria } => {
                let settings = resolve_judge_settings(&m.judge, &config.defaults);
                let client = clients.get(&settings).map_err(|e| ConfigError::InvalidMetric {
                    name: m.name.clone(),
                    reason: format!("{:#}", e),
                })?;
                tracing::debug!(
                    metric = %m.name,
                    provider = %settings.provider,
                    model = %settings.model,
                    "llm judge metric configured"
                );
                Arc::new(LlmJudgeMetric::new(m.name.clone(), criteria.clone(), client))
            }
            MetricKind::MustContain {
                terms,
                case_sensitive,
            } => Arc::new(MustContainMetric::new(
                m.name.clone(),
                terms.clone(),
                *case_sensitive,
            )),
            MetricKind::RegexMatch {
                pattern,
                case_insensitive,
            } => Arc::new(RegexMatchMetric::new(
                m.name.clone(),
                pattern,
                *case_insensitive,
            )?),
            MetricKind::Length {
                min_words,
                max_words,
            } => Arc::new(LengthMetric::new(m.name.clone(), *min_words, *max_words)),
        };
        metrics.push(WeightedMetric::new(metric, m.weight));
    }

    WeightedEvaluator::new(metrics)
}
