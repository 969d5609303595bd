use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use routeforge_core::{
    AdapterRequest, NormalizedResponse, ProviderAdapter, ProviderError, ProviderId, Role, ToolCall,
    Usage,
};

use crate::http::{build_client, endpoint, send_json, DEFAULT_TIMEOUT};
use crate::translate::split_system;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API adapter.
pub struct AnthropicAdapter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn build_body(request: &AdapterRequest) -> MessagesRequest<'_> {
    let (system, rest) = split_system(&request.messages);
    let messages = rest
        .into_iter()
        .map(|m| WireMessage {
            role: match m.role {
                Role::Assistant => "assistant",
                _ => "user",
            },
            content: &m.content,
        })
        .collect();
    let tools = request
        .tools
        .iter()
        .map(|t| WireTool {
            name: &t.name,
            description: &t.description,
            input_schema: &t.input_schema,
        })
        .collect();

    MessagesRequest {
        model: &request.model,
        max_tokens: request.max_output_tokens,
        temperature: request.temperature,
        system,
        messages,
        tools,
    }
}

fn normalize(response: MessagesResponse) -> NormalizedResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text } => content.push_str(&text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id: Some(id),
                name,
                arguments: input,
            }),
            ContentBlock::Other => {}
        }
    }
    let usage = response
        .usage
        .map(|u| Usage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    NormalizedResponse {
        content,
        usage,
        tool_calls,
        warnings: Vec::new(),
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, request: &AdapterRequest) -> Result<NormalizedResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(ProviderId::Anthropic))?;

        let body = build_body(request);
        debug!(model = %request.model, messages = body.messages.len(), "Sending request to Anthropic");

        let response: MessagesResponse = send_json(
            ProviderId::Anthropic,
            self.client
                .post(endpoint(&self.base_url, "v1/messages"))
                .header("x-api-key", api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body),
        )
        .await?;

        Ok(normalize(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::{ChatMessage, ToolSpec};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AdapterRequest {
        AdapterRequest {
            messages: vec![
                ChatMessage::system("Be precise."),
                ChatMessage::user("Write a sort."),
                ChatMessage::assistant("Which language?"),
                ChatMessage::user("Rust."),
            ],
            model: "claude-sonnet-4-5".into(),
            tools: vec![ToolSpec {
                name: "run_tests".into(),
                description: "Run the test suite".into(),
                input_schema: json!({"type": "object"}),
            }],
            max_output_tokens: 512,
            temperature: 0.2,
        }
    }

    #[test]
    fn test_system_goes_to_dedicated_slot() {
        let req = request();
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(body["system"], "Be precise.");
        let roles: Vec<_> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn test_normalize_tool_use_and_usage() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Running tests."},
                {"type": "tool_use", "id": "toolu_1", "name": "run_tests", "input": {"filter": "sort"}},
                {"type": "thinking", "thinking": "..."}
            ],
            "usage": {"input_tokens": 31, "output_tokens": 12}
        }))
        .unwrap();
        let normalized = normalize(response);
        assert_eq!(normalized.content, "Running tests.");
        assert_eq!(normalized.tool_calls.len(), 1);
        assert_eq!(normalized.tool_calls[0].arguments["filter"], "sort");
        assert_eq!(normalized.usage, Usage::new(31, 12));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let adapter = AnthropicAdapter::new(Some("   ".into()));
        assert!(!adapter.has_credentials());
        let err = adapter.invoke(&request()).await.unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured(ProviderId::Anthropic));
    }

    #[tokio::test]
    async fn test_invoke_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "fn sort() {}"}],
                "usage": {"input_tokens": 5, "output_tokens": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::new(Some("test-key".into())).with_base_url(server.uri());
        let response = adapter.invoke(&request()).await.unwrap();
        assert_eq!(response.content, "fn sort() {}");
        assert_eq!(response.usage, Usage::new(5, 7));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "Number of requests has exceeded your rate limit"}
            })))
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::new(Some("test-key".into())).with_base_url(server.uri());
        let err = adapter.invoke(&request()).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::RateLimited("Number of requests has exceeded your rate limit".into())
        );
    }
}
