//! The router: policy lookup, availability filtering, adapter invocation and
//! sequential fallback.
//!
//! Per logical call the router moves through
//! `select → invoke → (success | failed → select … ) | terminal`. Attempts are
//! strictly sequential in policy order and every failed provider is consumed,
//! so a call makes at most one attempt per candidate.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use routeforge_core::{
    AdapterRequest, ChatError, ChatRequest, ChatResult, NormalizedResponse, OutcomeEvent,
    OutcomeReporter, ProviderError, ProviderId, RouterError, TaskCategory,
};
use routeforge_providers::AdapterSet;

use crate::availability::AvailabilityRegistry;
use crate::models::ModelTable;
use crate::policy::RoutingPolicy;
use crate::reporter::TracingReporter;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Read-only view of the routing configuration for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub availability: BTreeMap<ProviderId, bool>,
    pub models: BTreeMap<ProviderId, String>,
    pub policy: BTreeMap<TaskCategory, Vec<ProviderId>>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Multi-provider chat router. Holds no per-call mutable state; share it as
/// `Arc<Router>` across tasks.
pub struct Router {
    adapters: AdapterSet,
    availability: Arc<AvailabilityRegistry>,
    policy: Arc<RoutingPolicy>,
    models: Arc<ModelTable>,
    reporter: Arc<dyn OutcomeReporter>,
    attempt_timeout: Option<Duration>,
}

impl Router {
    /// A router using the default policy, default models and a tracing reporter.
    pub fn new(adapters: AdapterSet, availability: Arc<AvailabilityRegistry>) -> Self {
        Self {
            adapters,
            availability,
            policy: Arc::new(RoutingPolicy::default()),
            models: Arc::new(ModelTable::default()),
            reporter: Arc::new(TracingReporter),
            attempt_timeout: None,
        }
    }

    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_models(mut self, models: ModelTable) -> Self {
        self.models = Arc::new(models);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn OutcomeReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Upper bound on a single provider attempt. Expiry counts as a provider
    /// failure and triggers fallback.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Route one request. Never fails: errors are returned in `ChatResult::error`.
    pub async fn chat(&self, request: ChatRequest) -> ChatResult {
        self.chat_with_cancel(request, &CancellationToken::new()).await
    }

    /// Like `chat`, but aborts the in-flight attempt and stops falling back
    /// once `cancel` fires.
    pub async fn chat_with_cancel(&self, request: ChatRequest, cancel: &CancellationToken) -> ChatResult {
        match self.route(&request, cancel).await {
            Ok(result) => result,
            Err(err) => {
                warn!(category = %request.task_category, error = %err, "Chat request failed");
                ChatResult::failure(ChatError::from(&err))
            }
        }
    }

    /// Candidate providers for a request, in attempt order.
    ///
    /// An explicit preference bypasses both the policy and the availability
    /// filter and is never widened to other providers.
    pub fn candidates(&self, request: &ChatRequest) -> Vec<ProviderId> {
        match request.preferred_provider {
            Some(preferred) => vec![preferred],
            None => self
                .policy
                .candidates(request.task_category)
                .iter()
                .copied()
                .filter(|p| self.availability.is_available(*p))
                .collect(),
        }
    }

    /// Availability, model names and policy. Pure read.
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            availability: self.availability.snapshot(),
            models: self.models.as_map().clone(),
            policy: self.policy.table().clone(),
        }
    }

    /// Re-run availability detection against the registered adapters.
    pub async fn refresh_availability(&self) {
        self.availability.refresh(&self.adapters).await;
    }

    async fn route(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<ChatResult, RouterError> {
        request.validate().map_err(RouterError::InvalidRequest)?;

        let category = request.task_category;
        let mut remaining: VecDeque<ProviderId> = self.candidates(request).into();
        if remaining.is_empty() {
            return Err(RouterError::NoProviderAvailable { category });
        }

        debug!(category = %category, candidates = ?remaining, "Resolved provider candidates");

        let mut last_failure: Option<RouterError> = None;
        while let Some(provider) = remaining.pop_front() {
            if cancel.is_cancelled() {
                return Err(RouterError::Cancelled { provider: None });
            }

            let model = self.models.get(provider).to_string();
            let started = Instant::now();
            let outcome = self.attempt(provider, &model, request, cancel).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(response) => {
                    info!(
                        provider = %provider,
                        model = %model,
                        latency_ms = elapsed_ms,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "Provider responded"
                    );
                    self.record(OutcomeEvent::success(category, provider, &model, elapsed_ms, response.usage));
                    return Ok(ChatResult::success(provider, model, response));
                }
                Err(source) => {
                    self.record(OutcomeEvent::failure(
                        category,
                        Some(provider),
                        Some(model),
                        elapsed_ms,
                        source.to_string(),
                    ));

                    if cancel.is_cancelled() {
                        return Err(RouterError::Cancelled { provider: Some(provider) });
                    }

                    let failure = RouterError::ProviderInvocationFailed { provider, source };
                    warn!(
                        provider = %provider,
                        remaining = remaining.len(),
                        error = %failure,
                        "Provider attempt failed"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        Err(match last_failure {
            Some(RouterError::ProviderInvocationFailed { provider, source }) => RouterError::AllProvidersFailed {
                provider,
                message: source.to_string(),
            },
            Some(other) => other,
            None => RouterError::NoProviderAvailable { category },
        })
    }

    /// One bounded, cancellable adapter call.
    async fn attempt(
        &self,
        provider: ProviderId,
        model: &str,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<NormalizedResponse, ProviderError> {
        let adapter = self
            .adapters
            .get(provider)
            .filter(|a| a.has_credentials())
            .ok_or(ProviderError::NotConfigured(provider))?;
        let adapter_request = AdapterRequest::from_chat(request, model);

        let invocation = async {
            match self.attempt_timeout {
                Some(limit) => tokio::time::timeout(limit, adapter.invoke(&adapter_request))
                    .await
                    .unwrap_or(Err(ProviderError::Timeout)),
                None => adapter.invoke(&adapter_request).await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = invocation => result,
        }
    }

    fn record(&self, event: OutcomeEvent) {
        if let Err(e) = self.reporter.report(&event) {
            warn!(error = %e, "Outcome reporter failed; event dropped");
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("adapters", &self.adapters)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}
