use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod fake;

pub use cache::{ClientCache, ClientFactory};
pub use fake::FakeClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub usage_tokens: u64,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
}

/// Pull the first JSON value out of a model reply that may wrap it in prose or fences.
pub fn extract_json(text: &str) -> anyhow::Result<serde_json::Value> {
    let text = text.trim();
    let start = text
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("no JSON object found in model output"))?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no JSON object found in extracted text"))?
        .map_err(|e| anyhow::anyhow!("invalid JSON in model output: {}", e))
}
