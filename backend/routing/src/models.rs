use std::collections::BTreeMap;

use serde::Serialize;

use routeforge_core::ProviderId;

/// Model requested from each provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelTable {
    models: BTreeMap<ProviderId, String>,
}

pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Anthropic => "claude-sonnet-4-5",
        ProviderId::OpenAi => "gpt-4o",
        ProviderId::Gemini => "gemini-2.0-flash",
        ProviderId::Ollama => "llama3.3:70b",
    }
}

impl Default for ModelTable {
    fn default() -> Self {
        Self {
            models: ProviderId::ALL
                .into_iter()
                .map(|p| (p, default_model(p).to_string()))
                .collect(),
        }
    }
}

impl ModelTable {
    /// Defaults with the given overrides applied. Blank names are ignored.
    pub fn with_overrides(overrides: impl IntoIterator<Item = (ProviderId, String)>) -> Self {
        let mut table = Self::default();
        for (provider, model) in overrides {
            let model = model.trim();
            if !model.is_empty() {
                table.models.insert(provider, model.to_string());
            }
        }
        table
    }

    pub fn get(&self, provider: ProviderId) -> &str {
        self.models
            .get(&provider)
            .map(String::as_str)
            .unwrap_or_else(|| default_model(provider))
    }

    pub fn as_map(&self) -> &BTreeMap<ProviderId, String> {
        &self.models
    }
}
