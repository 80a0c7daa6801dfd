use arena_core::metrics_api::{Metric, MetricInput, MetricValue};
use arena_core::ConfigError;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

/// Full score when the pattern matches anywhere in the submission, zero otherwise.
pub struct RegexMatchMetric {
    name: String,
    re: Regex,
}

impl RegexMatchMetric {
    /// Compiles eagerly so a bad pattern fails configuration, not a round.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let re = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .multi_line(true)
            .build()
            .map_err(|e| ConfigError::InvalidMetric {
                name: name.clone(),
                reason: format!("invalid regex pattern '{}': {}", pattern, e),
            })?;
        Ok(Self { name, re })
    }
}

#[async_trait]
impl Metric for RegexMatchMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, input: &MetricInput<'_>) -> anyhow::Result<MetricValue> {
        if self.re.is_match(input.submission) {
            Ok(MetricValue::full(format!("pattern '{}' matched", self.re.as_str())))
        } else {
            Ok(MetricValue::zero(format!(
                "pattern '{}' did not match",
                self.re.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_per_line_with_optional_case_folding() {
        let m = RegexMatchMetric::new("headings", r"^## summary", true).unwrap();
        let input = MetricInput {
            user_query: "q",
            submission: "intro\n## Summary\nbody",
            team_id: "team-a",
        };
        assert_eq!(m.evaluate(&input).await.unwrap().score, 100.0);

        let strict = RegexMatchMetric::new("headings", r"^## summary", false).unwrap();
        let v = strict.evaluate(&input).await.unwrap();
        assert_eq!(v.score, 0.0);
        assert!(v.comment.contains("did not match"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = RegexMatchMetric::new("broken", "(unclosed", false)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidMetric { ref name, .. } if name == "broken"));
    }
}
