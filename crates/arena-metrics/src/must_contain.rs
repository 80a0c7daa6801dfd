use arena_core::metrics_api::{Metric, MetricInput, MetricValue};
use async_trait::async_trait;

/// Scores the share of required terms present in the submission.
pub struct MustContainMetric {
    name: String,
    terms: Vec<String>,
    case_sensitive: bool,
}

impl MustContainMetric {
    pub fn new(name: impl Into<String>, terms: Vec<String>, case_sensitive: bool) -> Self {
        Self {
            name: name.into(),
            terms,
            case_sensitive,
        }
    }
}

#[async_trait]
impl Metric for MustContainMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, input: &MetricInput<'_>) -> anyhow::Result<MetricValue> {
        if self.terms.is_empty() {
            return Ok(MetricValue::full("no terms required"));
        }

        let haystack = if self.case_sensitive {
            input.submission.to_string()
        } else {
            input.submission.to_lowercase()
        };
        let missing: Vec<&str> = self
            .terms
            .iter()
            .filter(|t| {
                if self.case_sensitive {
                    !haystack.contains(t.as_str())
                } else {
                    !haystack.contains(&t.to_lowercase())
                }
            })
            .map(String::as_str)
            .collect();

        let found = self.terms.len() - missing.len();
        let score = 100.0 * found as f64 / self.terms.len() as f64;
        if missing.is_empty() {
            Ok(MetricValue::full("all required terms present"))
        } else {
            Ok(MetricValue::new(
                score,
                format!("missing terms: {}", missing.join(", ")),
            ))
        }
    }
}
