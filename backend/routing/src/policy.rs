//! Routing policy table: task category → ordered provider preference.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use routeforge_core::{ProviderId, TaskCategory};
use routeforge_core::ProviderId::{Anthropic, Gemini, Ollama, OpenAi};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("provider {provider} listed more than once for task category {category}")]
    DuplicateProvider {
        category: TaskCategory,
        provider: ProviderId,
    },
}

/// Immutable per-category preference lists, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingPolicy {
    table: BTreeMap<TaskCategory, Vec<ProviderId>>,
}

/// Built-in ranking used for any category the operator does not override.
pub fn default_preferences(category: TaskCategory) -> Vec<ProviderId> {
    match category {
        TaskCategory::Code => vec![Anthropic, OpenAi, Gemini, Ollama],
        TaskCategory::Chat => vec![OpenAi, Anthropic, Gemini, Ollama],
        TaskCategory::Search => vec![Gemini, OpenAi, Anthropic, Ollama],
        TaskCategory::Analysis => vec![Anthropic, Gemini, OpenAi, Ollama],
        TaskCategory::Creative => vec![OpenAi, Anthropic, Gemini, Ollama],
    }
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        let table = TaskCategory::ALL
            .into_iter()
            .map(|c| (c, default_preferences(c)))
            .collect();
        Self { table }
    }
}

impl RoutingPolicy {
    /// Build a policy from operator overrides. Categories missing from
    /// `overrides` keep the default ranking. An empty list is allowed and
    /// disables routing for that category.
    pub fn new(overrides: BTreeMap<TaskCategory, Vec<ProviderId>>) -> Result<Self, PolicyError> {
        let mut policy = Self::default();
        for (category, providers) in overrides {
            let mut seen = BTreeSet::new();
            for provider in &providers {
                if !seen.insert(*provider) {
                    return Err(PolicyError::DuplicateProvider {
                        category,
                        provider: *provider,
                    });
                }
            }
            policy.table.insert(category, providers);
        }
        Ok(policy)
    }

    /// Ordered candidates for a category. Pure lookup.
    pub fn candidates(&self, category: TaskCategory) -> &[ProviderId] {
        self.table.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table(&self) -> &BTreeMap<TaskCategory, Vec<ProviderId>> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists_have_no_duplicates() {
        let policy = RoutingPolicy::default();
        for category in TaskCategory::ALL {
            let candidates = policy.candidates(category);
            let unique: BTreeSet<_> = candidates.iter().collect();
            assert_eq!(unique.len(), candidates.len(), "{category}");
            assert!(candidates.len() <= ProviderId::ALL.len());
            assert!(!candidates.is_empty());
        }
    }

    #[test]
    fn test_categories_rank_differently() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.candidates(TaskCategory::Code)[0], Anthropic);
        assert_eq!(policy.candidates(TaskCategory::Chat)[0], OpenAi);
        assert_eq!(policy.candidates(TaskCategory::Search)[0], Gemini);
    }

    #[test]
    fn test_overrides_are_independent_per_category() {
        let mut overrides = BTreeMap::new();
        overrides.insert(TaskCategory::Creative, vec![Ollama, Gemini]);
        overrides.insert(TaskCategory::Search, vec![]);
        let policy = RoutingPolicy::new(overrides).unwrap();

        assert_eq!(policy.candidates(TaskCategory::Creative), &[Ollama, Gemini]);
        assert!(policy.candidates(TaskCategory::Search).is_empty());
        assert_eq!(
            policy.candidates(TaskCategory::Code),
            default_preferences(TaskCategory::Code).as_slice()
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut overrides = BTreeMap::new();
        overrides.insert(TaskCategory::Code, vec![OpenAi, Anthropic, OpenAi]);
        assert_eq!(
            RoutingPolicy::new(overrides).unwrap_err(),
            PolicyError::DuplicateProvider {
                category: TaskCategory::Code,
                provider: OpenAi,
            }
        );
    }
}
