mod judge_internal;

use crate::model::ImprovementJudgment;
use crate::providers::llm::LlmClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Decides whether another round is worth running. Stateless across calls.
#[async_trait]
pub trait JudgmentClient: Send + Sync {
    async fn judge(&self, formatted_prompt: &str) -> anyhow::Result<ImprovementJudgment>;
}

/// Judgment backed by a judge model that answers in JSON.
#[derive(Clone)]
pub struct LlmJudgmentClient {
    client: Arc<dyn LlmClient>,
    hijack_defense: bool,
}

impl LlmJudgmentClient {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            hijack_defense: true,
        }
    }

    /// Disable the "treat content as data" instruction appended to the system prompt.
    pub fn without_hijack_defense(mut self) -> Self {
        self.hijack_defense = false;
        self
    }
}

#[async_trait]
impl JudgmentClient for LlmJudgmentClient {
    async fn judge(&self, formatted_prompt: &str) -> anyhow::Result<ImprovementJudgment> {
        judge_internal::client::call_judgment_impl(
            self.client.as_ref(),
            formatted_prompt,
            self.hijack_defense,
        )
        .await
    }
}
