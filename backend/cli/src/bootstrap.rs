//! Wiring: config → adapters → availability → router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use routeforge_config::RouteForgeConfig;
use routeforge_core::{OutcomeReporter, ProviderId};
use routeforge_providers::{AdapterSet, AnthropicAdapter, GeminiAdapter, OllamaAdapter, OpenAiAdapter};
use routeforge_routing::{AvailabilityRegistry, ModelTable, Router, RoutingPolicy};

/// One adapter per provider. Adapters without a credential are still
/// registered so an explicit preference fails with "not configured".
pub fn build_adapters(config: &RouteForgeConfig) -> AdapterSet {
    let timeout = Duration::from_secs(config.provider_timeout_secs);
    let mut adapters = AdapterSet::new();

    for provider in ProviderId::ALL {
        let settings = config.provider(provider);
        let base_url = settings.base_url.clone();
        match provider {
            ProviderId::Anthropic => {
                let mut adapter = AnthropicAdapter::new(settings.api_key).with_timeout(timeout);
                if let Some(url) = base_url {
                    adapter = adapter.with_base_url(url);
                }
                adapters.register(Arc::new(adapter));
            }
            ProviderId::OpenAi => {
                let mut adapter = OpenAiAdapter::new(settings.api_key).with_timeout(timeout);
                if let Some(url) = base_url {
                    adapter = adapter.with_base_url(url);
                }
                adapters.register(Arc::new(adapter));
            }
            ProviderId::Gemini => {
                let mut adapter = GeminiAdapter::new(settings.api_key).with_timeout(timeout);
                if let Some(url) = base_url {
                    adapter = adapter.with_base_url(url);
                }
                adapters.register(Arc::new(adapter));
            }
            ProviderId::Ollama => {
                let mut adapter = OllamaAdapter::new().with_timeout(timeout);
                if let Some(url) = base_url {
                    adapter = adapter.with_base_url(url);
                }
                adapters.register(Arc::new(adapter));
            }
        }
    }

    adapters
}

/// Build a ready router. Runs availability detection, which may probe the
/// local daemon.
pub async fn build_router(config: &RouteForgeConfig, reporter: Arc<dyn OutcomeReporter>) -> Result<Router> {
    let policy = RoutingPolicy::new(config.policy.clone()).context("Invalid routing policy")?;
    let models = ModelTable::with_overrides(config.model_overrides());
    let adapters = build_adapters(config);

    let availability = Arc::new(
        AvailabilityRegistry::detect(&adapters, Duration::from_secs(config.probe_timeout_secs)).await,
    );

    info!(
        adapters = adapters.len(),
        provider_timeout_secs = config.provider_timeout_secs,
        "Router initialized"
    );

    Ok(Router::new(adapters, availability)
        .with_policy(policy)
        .with_models(models)
        .with_reporter(reporter)
        .with_attempt_timeout(Duration::from_secs(config.provider_timeout_secs)))
}
