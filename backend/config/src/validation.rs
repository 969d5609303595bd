//! Config validation: one pass, all problems reported with a field path.

use std::collections::BTreeSet;

use thiserror::Error;

use routeforge_core::ProviderId;

use crate::schema::RouteForgeConfig;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &RouteForgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_providers(config, &mut report);
    validate_policy(config, &mut report);
    validate_timeouts(config, &mut report);
    validate_server(config, &mut report);
    report
}

fn validate_providers(config: &RouteForgeConfig, report: &mut ValidationReport) {
    for (id, settings) in &config.providers {
        let path = format!("providers.{id}");
        if let Some(url) = &settings.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                report.error(
                    format!("{path}.baseUrl"),
                    format!("'{url}' is not an http(s) URL"),
                );
            }
        }
        if settings.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            report.error(format!("{path}.model"), "Model name cannot be empty");
        }
    }

    if config.credentialed_providers().is_empty() {
        report.warn(
            "providers",
            "No remote provider credential configured; only the local provider can serve requests",
        );
    }
}

fn validate_policy(config: &RouteForgeConfig, report: &mut ValidationReport) {
    for (category, providers) in &config.policy {
        let path = format!("policy.{category}");
        let mut seen = BTreeSet::new();
        for provider in providers {
            if !seen.insert(*provider) {
                report.error(&path, format!("Provider '{provider}' is listed more than once"));
            }
        }
        if providers.is_empty() {
            report.warn(&path, "Empty preference list; requests in this category will always fail");
        }
        let reachable = providers
            .iter()
            .any(|p| *p == ProviderId::Ollama || config.provider(*p).has_api_key());
        if !providers.is_empty() && !reachable {
            report.warn(&path, "No listed provider has a credential configured");
        }
    }
}

fn validate_timeouts(config: &RouteForgeConfig, report: &mut ValidationReport) {
    if config.provider_timeout_secs == 0 {
        report.error("providerTimeoutSecs", "Provider timeout must be >= 1 second");
    }
    if config.probe_timeout_secs == 0 {
        report.error("probeTimeoutSecs", "Probe timeout must be >= 1 second");
    }
    if config.probe_timeout_secs > config.provider_timeout_secs {
        report.warn(
            "probeTimeoutSecs",
            "Probe timeout exceeds the provider timeout; startup may stall on an unreachable daemon",
        );
    }
}

fn validate_server(config: &RouteForgeConfig, report: &mut ValidationReport) {
    if config.port == 0 {
        report.error("port", "Port must be non-zero");
    } else if config.port < 1024 && config.port != 80 && config.port != 443 {
        report.warn(
            "port",
            format!("Port {} requires elevated privileges; consider using a port >= 1024", config.port),
        );
    }
}
