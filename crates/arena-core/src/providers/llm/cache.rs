use super::{FakeClient, LlmClient};
use crate::config::ResolvedJudgeSettings;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Builds a client for one resolved setting tuple.
pub type ClientFactory =
    Arc<dyn Fn(&ResolvedJudgeSettings) -> anyhow::Result<Arc<dyn LlmClient>> + Send + Sync>;

/// Clients keyed by resolved (provider, model, temperature, max_tokens).
///
/// Owned by whoever builds evaluators; there is no process-wide instance.
pub struct ClientCache {
    factory: ClientFactory,
    clients: Mutex<HashMap<String, Arc<dyn LlmClient>>>,
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl ClientCache {
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Cache whose factory only knows the offline `fake` provider.
    pub fn offline() -> Self {
        Self::new(Arc::new(
            |s: &ResolvedJudgeSettings| -> anyhow::Result<Arc<dyn LlmClient>> {
                if s.provider != "fake" {
                    anyhow::bail!("no client available for provider '{}'", s.provider);
                }
                Ok(Arc::new(FakeClient::new(s.model.clone())))
            },
        ))
    }

    pub fn get(&self, settings: &ResolvedJudgeSettings) -> anyhow::Result<Arc<dyn LlmClient>> {
        let key = settings.cache_key();
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| anyhow::anyhow!("client cache lock poisoned"))?;
        if let Some(c) = clients.get(&key) {
            return Ok(Arc::clone(c));
        }
        let client = (self.factory)(settings)?;
        tracing::debug!(key = %key, "client cache miss");
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    pub fn clear(&self) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
