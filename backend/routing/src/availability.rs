//! Availability registry: which providers are usable right now.
//!
//! Remote providers count as available when a credential was configured; no
//! network call is made for them. The local provider is probed once (bounded
//! by a timeout) and the answer cached until the next `refresh`.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use routeforge_core::{ProviderAdapter, ProviderId};
use routeforge_providers::AdapterSet;

/// Default bound on the local reachability probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Per-provider availability. Written at startup and on explicit refresh,
/// read by every routing decision.
#[derive(Debug)]
pub struct AvailabilityRegistry {
    state: RwLock<BTreeMap<ProviderId, bool>>,
    probe_timeout: Duration,
}

impl AvailabilityRegistry {
    /// A registry with fixed answers. Providers not listed are unavailable.
    pub fn from_state(state: impl IntoIterator<Item = (ProviderId, bool)>) -> Self {
        Self {
            state: RwLock::new(state.into_iter().collect()),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Check every registered adapter once.
    pub async fn detect(adapters: &AdapterSet, probe_timeout: Duration) -> Self {
        let registry = Self {
            state: RwLock::new(BTreeMap::new()),
            probe_timeout,
        };
        registry.refresh(adapters).await;
        registry
    }

    pub fn is_available(&self, provider: ProviderId) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&provider)
            .copied()
            .unwrap_or(false)
    }

    /// Availability of every known provider, in stable order.
    pub fn snapshot(&self) -> BTreeMap<ProviderId, bool> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        ProviderId::ALL
            .into_iter()
            .map(|p| (p, state.get(&p).copied().unwrap_or(false)))
            .collect()
    }

    /// Re-run detection. Probes run before the write lock is taken so readers
    /// are never blocked on the network.
    pub async fn refresh(&self, adapters: &AdapterSet) {
        let mut detected = BTreeMap::new();
        for (provider, adapter) in adapters.iter() {
            let available = check(provider, adapter.as_ref(), self.probe_timeout).await;
            detected.insert(provider, available);
        }

        let available: Vec<_> = detected
            .iter()
            .filter(|(_, up)| **up)
            .map(|(p, _)| p.as_str())
            .collect();
        info!(available = ?available, "Provider availability detected");

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = detected;
    }
}

async fn check(provider: ProviderId, adapter: &dyn ProviderAdapter, probe_timeout: Duration) -> bool {
    if !provider.is_local() {
        return adapter.has_credentials();
    }

    match tokio::time::timeout(probe_timeout, adapter.probe()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(provider = %provider, error = %e, "Local provider probe failed");
            false
        }
        Err(_) => {
            warn!(provider = %provider, timeout_ms = probe_timeout.as_millis() as u64, "Local provider probe timed out");
            false
        }
    }
}
