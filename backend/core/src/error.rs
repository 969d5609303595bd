use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProviderId, TaskCategory};

/// Failure of a single adapter invocation.
///
/// Adapters collapse every provider-native failure into one of these variants.
/// They never retry; fallback is the router's job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(ProviderId),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether the same request could plausibly succeed later against the same provider.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_)
                | ProviderError::Timeout
                | ProviderError::Network(_)
                | ProviderError::Upstream { status: 500..=599, .. }
        )
    }
}

/// Call-level routing error.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no provider available for task category {category}")]
    NoProviderAvailable { category: TaskCategory },

    #[error("provider {provider} failed: {source}")]
    ProviderInvocationFailed {
        provider: ProviderId,
        #[source]
        source: ProviderError,
    },

    #[error("all providers failed; last attempt {provider}: {message}")]
    AllProvidersFailed { provider: ProviderId, message: String },

    #[error("chat request cancelled")]
    Cancelled { provider: Option<ProviderId> },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatErrorKind {
    NoProviderAvailable,
    AllProvidersFailed,
    Cancelled,
    InvalidRequest,
}

/// Structured failure carried on a `ChatResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub provider: Option<ProviderId>,
}

impl From<&RouterError> for ChatError {
    fn from(err: &RouterError) -> Self {
        let (kind, provider) = match err {
            RouterError::NoProviderAvailable { .. } => (ChatErrorKind::NoProviderAvailable, None),
            // A lone invocation failure surfaces as the exhausted case.
            RouterError::ProviderInvocationFailed { provider, .. } => {
                (ChatErrorKind::AllProvidersFailed, Some(*provider))
            }
            RouterError::AllProvidersFailed { provider, .. } => {
                (ChatErrorKind::AllProvidersFailed, Some(*provider))
            }
            RouterError::Cancelled { provider } => (ChatErrorKind::Cancelled, *provider),
            RouterError::InvalidRequest(_) => (ChatErrorKind::InvalidRequest, None),
        };
        Self {
            kind,
            message: err.to_string(),
            provider,
        }
    }
}

impl From<RouterError> for ChatError {
    fn from(err: RouterError) -> Self {
        ChatError::from(&err)
    }
}

/// Unknown tag while parsing a category or provider name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseTagError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimited("slow down".into()).is_retryable());
        assert!(ProviderError::Upstream { status: 503, message: String::new() }.is_retryable());
        assert!(!ProviderError::Upstream { status: 418, message: String::new() }.is_retryable());
        assert!(!ProviderError::Auth("bad key".into()).is_retryable());
        assert!(!ProviderError::NotConfigured(ProviderId::Anthropic).is_retryable());
    }

    #[test]
    fn test_chat_error_from_router_error() {
        let err = RouterError::AllProvidersFailed {
            provider: ProviderId::Gemini,
            message: "request timed out".into(),
        };
        let chat: ChatError = (&err).into();
        assert_eq!(chat.kind, ChatErrorKind::AllProvidersFailed);
        assert_eq!(chat.provider, Some(ProviderId::Gemini));
        assert!(chat.message.contains("request timed out"));

        let chat: ChatError = RouterError::NoProviderAvailable {
            category: TaskCategory::Code,
        }
        .into();
        assert_eq!(chat.kind, ChatErrorKind::NoProviderAvailable);
        assert!(chat.provider.is_none());
        assert!(chat.message.contains("code"));
    }

    #[test]
    fn test_chat_error_kind_serialization() {
        let json = serde_json::to_string(&ChatErrorKind::NoProviderAvailable).unwrap();
        assert_eq!(json, r#""no_provider_available""#);
    }
}
