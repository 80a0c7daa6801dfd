//! Two-level setting resolution: a metric-level value wins over the evaluator-wide
//! default, and built-in constants fill whatever both levels leave unset.

use super::JudgeSettings;
use serde::Serialize;

pub const DEFAULT_PROVIDER: &str = "fake";
pub const DEFAULT_MODEL: &str = "default";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Metric-level value if present, else default-level value, else `None`.
pub fn resolve_override<T: Clone>(metric_level: Option<&T>, default_level: Option<&T>) -> Option<T> {
    metric_level.or(default_level).cloned()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedJudgeSettings {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ResolvedJudgeSettings {
    /// Stable identity used for client caching. Temperature is keyed by its bit pattern
    /// so `0.0` and `-0.0` stay distinct without float hashing.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{:08x}:{}",
            self.provider,
            self.model,
            self.temperature.to_bits(),
            self.max_tokens
        )
    }
}

pub fn resolve_judge_settings(
    metric: &JudgeSettings,
    defaults: &JudgeSettings,
) -> ResolvedJudgeSettings {
    ResolvedJudgeSettings {
        provider: resolve_override(metric.provider.as_ref(), defaults.provider.as_ref())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        model: resolve_override(metric.model.as_ref(), defaults.model.as_ref())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: resolve_override(metric.temperature.as_ref(), defaults.temperature.as_ref())
            .unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: resolve_override(metric.max_tokens.as_ref(), defaults.max_tokens.as_ref())
            .unwrap_or(DEFAULT_MAX_TOKENS),
    }
}
