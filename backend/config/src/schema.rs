//! RouteForge runtime configuration schema.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use routeforge_core::{ProviderId, TaskCategory};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_PATH: &str = "routeforge.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Credentials and endpoint for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint override. `None` means the adapter's public default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model override. `None` means the built-in model table entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderSettings {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Top-level configuration, assembled from the environment and an optional
/// policy overlay file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteForgeConfig {
    pub providers: BTreeMap<ProviderId, ProviderSettings>,
    /// Per-attempt provider timeout.
    pub provider_timeout_secs: u64,
    /// Bound on the local reachability probe.
    pub probe_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_file: Option<PathBuf>,
    /// Policy overrides from the overlay file. Categories not listed keep the defaults.
    #[serde(default)]
    pub policy: BTreeMap<TaskCategory, Vec<ProviderId>>,
    pub bind_address: String,
    pub port: u16,
    pub db_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for RouteForgeConfig {
    fn default() -> Self {
        let mut providers: BTreeMap<ProviderId, ProviderSettings> = ProviderId::ALL
            .into_iter()
            .map(|p| (p, ProviderSettings::default()))
            .collect();
        if let Some(ollama) = providers.get_mut(&ProviderId::Ollama) {
            ollama.base_url = Some(DEFAULT_OLLAMA_URL.to_string());
        }

        Self {
            providers,
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            policy_file: None,
            policy: BTreeMap::new(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_dir: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RouteForgeConfig {
    /// Settings for a provider; an empty entry if none were configured.
    pub fn provider(&self, id: ProviderId) -> ProviderSettings {
        self.providers.get(&id).cloned().unwrap_or_default()
    }

    pub fn provider_mut(&mut self, id: ProviderId) -> &mut ProviderSettings {
        self.providers.entry(id).or_default()
    }

    /// Model overrides that were actually configured.
    pub fn model_overrides(&self) -> BTreeMap<ProviderId, String> {
        self.providers
            .iter()
            .filter_map(|(id, s)| s.model.clone().map(|m| (*id, m)))
            .collect()
    }

    /// Remote providers with a credential present.
    pub fn credentialed_providers(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .filter(|(id, s)| !id.is_local() && s.has_api_key())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouteForgeConfig::default();
        assert_eq!(config.providers.len(), 4);
        assert_eq!(
            config.provider(ProviderId::Ollama).base_url.as_deref(),
            Some(DEFAULT_OLLAMA_URL)
        );
        assert!(config.credentialed_providers().is_empty());
        assert!(config.model_overrides().is_empty());
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_blank_key_is_not_a_credential() {
        let mut config = RouteForgeConfig::default();
        config.provider_mut(ProviderId::OpenAi).api_key = Some("   ".into());
        config.provider_mut(ProviderId::Anthropic).api_key = Some("sk-ant-1".into());
        assert_eq!(config.credentialed_providers(), vec![ProviderId::Anthropic]);
    }
}
