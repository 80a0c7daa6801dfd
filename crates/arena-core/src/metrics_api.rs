use async_trait::async_trait;

/// What a metric sees for one submission.
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    pub user_query: &'a str,
    pub submission: &'a str,
    pub team_id: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// In [0, 100].
    pub score: f64,
    pub comment: String,
}

impl MetricValue {
    pub fn new(score: f64, comment: impl Into<String>) -> Self {
        Self {
            score,
            comment: comment.into(),
        }
    }

    pub fn full(comment: impl Into<String>) -> Self {
        Self::new(100.0, comment)
    }

    pub fn zero(comment: impl Into<String>) -> Self {
        Self::new(0.0, comment)
    }
}

#[async_trait]
pub trait Metric: Send + Sync {
    fn name(&self) -> &str;
    async fn evaluate(&self, input: &MetricInput<'_>) -> anyhow::Result<MetricValue>;
}
