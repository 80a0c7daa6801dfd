use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub execution_id: String,
    pub team_id: String,
    pub round_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutput {
    pub output: String,
    /// Conversation messages that produced `output`, persisted verbatim.
    #[serde(default)]
    pub history: Vec<serde_json::Value>,
    #[serde(default)]
    pub token_usage: u64,
}

impl SubmissionOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }
}

/// Produces a team's submission for one round.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        prompt: &str,
        ctx: &SubmissionContext,
    ) -> anyhow::Result<SubmissionOutput>;
}
