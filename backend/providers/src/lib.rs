//! Provider adapters for RouteForge.
//!
//! One `ProviderAdapter` implementation per backend, plus the `AdapterSet`
//! the router looks adapters up in.

pub mod anthropic;
pub mod gemini;
pub mod http;
pub mod mock;
pub mod ollama;
pub mod openai;
mod translate;

use std::collections::BTreeMap;
use std::sync::Arc;

use routeforge_core::{ProviderAdapter, ProviderId};

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use http::DEFAULT_TIMEOUT;
pub use mock::MockProvider;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;

/// Adapters keyed by the provider they talk to.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: BTreeMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&id).cloned()
    }

    /// Registered provider ids in stable order.
    pub fn ids(&self) -> Vec<ProviderId> {
        self.adapters.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderId, &Arc<dyn ProviderAdapter>)> {
        self.adapters.iter().map(|(id, adapter)| (*id, adapter))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSet").field("providers", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let set = AdapterSet::new()
            .with(Arc::new(MockProvider::new(ProviderId::Ollama)))
            .with(Arc::new(MockProvider::new(ProviderId::Anthropic)))
            .with(Arc::new(OpenAiAdapter::new(None)));

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.ids(),
            vec![ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::Ollama]
        );
        assert!(set.get(ProviderId::Gemini).is_none());
        assert!(!set.get(ProviderId::OpenAi).unwrap().has_credentials());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut set = AdapterSet::new();
        set.register(Arc::new(MockProvider::new(ProviderId::Gemini)));
        set.register(Arc::new(GeminiAdapter::new(Some("key".into()))));
        assert_eq!(set.len(), 1);
    }
}
