//! Environment-variable loading.
//!
//! Every setting has an environment variable; empty values count as absent.

use std::collections::HashMap;
use std::path::PathBuf;

use routeforge_core::ProviderId;

use crate::schema::RouteForgeConfig;

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Accepted when `GEMINI_API_KEY` is absent.
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const OLLAMA_URL: &str = "OLLAMA_URL";
pub const PROVIDER_TIMEOUT_SECS: &str = "ROUTEFORGE_PROVIDER_TIMEOUT_SECS";
pub const PROBE_TIMEOUT_SECS: &str = "ROUTEFORGE_PROBE_TIMEOUT_SECS";
pub const POLICY_FILE: &str = "ROUTEFORGE_POLICY_FILE";
pub const BIND: &str = "ROUTEFORGE_BIND";
pub const PORT: &str = "ROUTEFORGE_PORT";
pub const DB: &str = "ROUTEFORGE_DB";
pub const LOG_DIR: &str = "ROUTEFORGE_LOG_DIR";
pub const RUST_LOG: &str = "RUST_LOG";

/// A variable was set but could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid value {value:?} for {var}: expected {expected}")]
pub struct InvalidEnvVarError {
    pub var: String,
    pub value: String,
    pub expected: &'static str,
}

fn prefix(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Anthropic => "ANTHROPIC",
        ProviderId::OpenAi => "OPENAI",
        ProviderId::Gemini => "GEMINI",
        ProviderId::Ollama => "OLLAMA",
    }
}

struct Vars<'a>(&'a HashMap<String, String>);

impl Vars<'_> {
    fn get(&self, name: &str) -> Option<String> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn parse<T: std::str::FromStr>(
        &self,
        name: &str,
        expected: &'static str,
    ) -> Result<Option<T>, InvalidEnvVarError> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| InvalidEnvVarError {
                var: name.to_string(),
                value: raw,
                expected,
            }),
        }
    }
}

impl RouteForgeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, InvalidEnvVarError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, InvalidEnvVarError> {
        let vars = Vars(vars);
        let mut config = RouteForgeConfig::default();

        config.provider_mut(ProviderId::Anthropic).api_key = vars.get(ANTHROPIC_API_KEY);
        config.provider_mut(ProviderId::OpenAi).api_key = vars.get(OPENAI_API_KEY);
        config.provider_mut(ProviderId::Gemini).api_key =
            vars.get(GEMINI_API_KEY).or_else(|| vars.get(GOOGLE_API_KEY));

        for provider in ProviderId::ALL {
            let settings = config.provider_mut(provider);
            if provider.is_local() {
                if let Some(url) = vars.get(OLLAMA_URL) {
                    settings.base_url = Some(url);
                }
            } else {
                settings.base_url = vars.get(&format!("{}_BASE_URL", prefix(provider)));
            }
            settings.model = vars.get(&format!("{}_MODEL", prefix(provider)));
        }

        if let Some(secs) = vars.parse(PROVIDER_TIMEOUT_SECS, "whole seconds")? {
            config.provider_timeout_secs = secs;
        }
        if let Some(secs) = vars.parse(PROBE_TIMEOUT_SECS, "whole seconds")? {
            config.probe_timeout_secs = secs;
        }
        if let Some(port) = vars.parse(PORT, "a TCP port")? {
            config.port = port;
        }
        if let Some(bind) = vars.get(BIND) {
            config.bind_address = bind;
        }
        if let Some(db) = vars.get(DB) {
            config.db_path = PathBuf::from(db);
        }
        config.policy_file = vars.get(POLICY_FILE).map(PathBuf::from);
        config.log_dir = vars.get(LOG_DIR).map(PathBuf::from);
        if let Some(level) = vars.get(RUST_LOG) {
            config.log_level = level;
        }

        Ok(config)
    }
}
