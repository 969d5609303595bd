//! Policy overlay file: YAML with optional `policy` and `models` maps.
//!
//! ```yaml
//! policy:
//!   code: [ollama, anthropic]
//! models:
//!   openai: gpt-4o-mini
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use routeforge_core::{ProviderId, TaskCategory};

use crate::schema::RouteForgeConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverlay {
    #[serde(default)]
    pub policy: BTreeMap<TaskCategory, Vec<ProviderId>>,
    #[serde(default)]
    pub models: BTreeMap<ProviderId, String>,
}

pub fn parse_overlay(raw: &str) -> Result<PolicyOverlay> {
    // An empty document deserializes as unit, not as an empty map.
    if raw.trim().is_empty() {
        return Ok(PolicyOverlay::default());
    }
    serde_yaml::from_str(raw).context("Failed to parse policy overlay YAML")
}

pub async fn load_overlay(path: &Path) -> Result<PolicyOverlay> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
    let overlay = parse_overlay(&raw).with_context(|| format!("Invalid policy file: {}", path.display()))?;
    info!(
        path = %path.display(),
        categories = overlay.policy.len(),
        models = overlay.models.len(),
        "Loaded policy overlay"
    );
    Ok(overlay)
}

impl RouteForgeConfig {
    /// Merge an overlay. Policy entries replace per category; models only fill
    /// providers whose model was not already set from the environment.
    pub fn apply_overlay(&mut self, overlay: PolicyOverlay) {
        self.policy.extend(overlay.policy);
        for (provider, model) in overlay.models {
            let settings = self.provider_mut(provider);
            if settings.model.is_none() && !model.trim().is_empty() {
                settings.model = Some(model);
            }
        }
    }

    /// Read and merge the overlay named by `policy_file` (`ROUTEFORGE_POLICY_FILE`).
    /// No-op without one. Run after logging is up so the load is traced.
    pub async fn apply_policy_file(&mut self) -> Result<()> {
        if let Some(path) = self.policy_file.clone() {
            let overlay = load_overlay(&path).await?;
            self.apply_overlay(overlay);
        }
        Ok(())
    }
}
