//! Shared HTTP plumbing: pooled clients and provider-native error classification.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use routeforge_core::{ProviderError, ProviderId};
use routeforge_logging::redact_sensitive_data;

/// Default upper bound on a single HTTP exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest upstream error excerpt kept in a `ProviderError`.
const MAX_ERROR_CHARS: usize = 400;

/// Build the connection-pooled client owned by one adapter.
pub(crate) fn build_client(timeout: Duration) -> Client {
    client_or_default(Client::builder().timeout(timeout).build(), timeout)
}

/// The default client has no request timeout; only the router's per-attempt
/// timeout bounds calls made through it.
fn client_or_default(built: reqwest::Result<Client>, timeout: Duration) -> Client {
    match built {
        Ok(client) => client,
        Err(e) => {
            warn!(
                error = %e,
                timeout_secs = timeout.as_secs(),
                "Failed to build HTTP client, falling back to default client without timeout"
            );
            Client::new()
        }
    }
}

/// Send a request and decode a JSON body, mapping every failure onto `ProviderError`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(from_transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(provider = %provider, status = status.as_u16(), "Provider returned error status");
        return Err(classify_status(status.as_u16(), &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(redact_sensitive_data(&e.to_string())))
}

pub(crate) fn from_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::InvalidResponse(redact_sensitive_data(&err.to_string()))
    } else {
        ProviderError::Network(redact_sensitive_data(&err.to_string()))
    }
}

/// Map an HTTP error status and body onto the adapter failure taxonomy.
pub(crate) fn classify_status(status: u16, body: &str) -> ProviderError {
    let message = error_message(body);
    match status {
        401 | 403 => ProviderError::Auth(message),
        429 => ProviderError::RateLimited(message),
        400 | 404 | 413 | 422 => ProviderError::MalformedRequest(message),
        408 | 504 => ProviderError::Timeout,
        _ => ProviderError::Upstream { status, message },
    }
}

/// Pull a readable message out of the common `{"error": ...}` envelopes.
fn error_message(body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("error") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(obj) => obj.get("message").and_then(|m| m.as_str()).map(String::from),
            None => v.get("message").and_then(|m| m.as_str()).map(String::from),
        })
        .unwrap_or_else(|| body.trim().to_string());

    let truncated: String = extracted.chars().take(MAX_ERROR_CHARS).collect();
    redact_sensitive_data(&truncated)
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
