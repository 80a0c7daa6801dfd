use arena_core::metrics_api::{Metric, MetricInput, MetricValue};
use async_trait::async_trait;

/// Word-count band. Inside the band scores 100; outside, the score falls off linearly
/// with the relative distance to the nearest bound.
pub struct LengthMetric {
    name: String,
    min_words: Option<u32>,
    max_words: Option<u32>,
}

impl LengthMetric {
    pub fn new(name: impl Into<String>, min_words: Option<u32>, max_words: Option<u32>) -> Self {
        Self {
            name: name.into(),
            min_words,
            max_words,
        }
    }

    fn score_for(&self, words: u32) -> (f64, String) {
        if let Some(lo) = self.min_words.filter(|lo| words < *lo) {
            let ratio = f64::from(words) / f64::from(lo);
            return (
                100.0 * ratio,
                format!("{} words, below minimum of {}", words, lo),
            );
        }
        if let Some(hi) = self.max_words.filter(|hi| words > *hi) {
            let over = f64::from(words - hi) / f64::from(hi.max(1));
            return (
                (100.0 * (1.0 - over)).max(0.0),
                format!("{} words, above maximum of {}", words, hi),
            );
        }
        (100.0, format!("{} words", words))
    }
}

#[async_trait]
impl Metric for LengthMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, input: &MetricInput<'_>) -> anyhow::Result<MetricValue> {
        let words = u32::try_from(input.submission.split_whitespace().count()).unwrap_or(u32::MAX);
        let (score, comment) = self.score_for(words);
        Ok(MetricValue::new(score, comment))
    }
}
