use anyhow::Result;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::event::OutcomeEvent;
use crate::types::{AdapterRequest, NormalizedResponse, ProviderId};

/// Translation layer between the canonical request/response shape and one
/// provider's wire format.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn id(&self) -> ProviderId;

    /// Whether a credential was supplied at construction. Local providers
    /// need none and return `true`.
    fn has_credentials(&self) -> bool {
        true
    }

    /// Lightweight reachability check. Only meaningful for local providers;
    /// remote adapters never touch the network here.
    async fn probe(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Send one request and translate the response back.
    async fn invoke(&self, request: &AdapterRequest) -> Result<NormalizedResponse, ProviderError>;
}

/// Sink for routing outcomes. Failures are logged by the caller and otherwise ignored.
pub trait OutcomeReporter: Send + Sync {
    fn report(&self, event: &OutcomeEvent) -> Result<()>;
}
