use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use routeforge_core::{
    AdapterRequest, NormalizedResponse, ProviderAdapter, ProviderError, ProviderId, ToolCall, Usage,
};

use crate::http::{build_client, classify_status, endpoint, from_transport, send_json, DEFAULT_TIMEOUT};
use crate::translate::{collapse_roles, function_tools, Turn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama local LLM provider.
pub struct OllamaAdapter {
    client: Client,
    base_url: String,
}

impl OllamaAdapter {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
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

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatBody {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    options: Options,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn build_body(request: &AdapterRequest) -> ChatBody {
    let messages = collapse_roles(&request.messages)
        .into_iter()
        .map(|(turn, content)| WireMessage {
            role: match turn {
                Turn::Input => "user",
                Turn::Output => "assistant",
            },
            content,
        })
        .collect();

    ChatBody {
        model: request.model.clone(),
        messages,
        stream: false,
        options: Options {
            temperature: request.temperature,
            num_predict: request.max_output_tokens,
        },
        tools: function_tools(&request.tools),
    }
}

fn normalize(response: ChatResponse) -> NormalizedResponse {
    let tool_calls = response
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: None,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    NormalizedResponse {
        content: response.message.content,
        usage: Usage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        ),
        tool_calls,
        warnings: Vec::new(),
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    /// Lists locally installed models; any answer other than 2xx is unreachable.
    async fn probe(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "api/tags"))
            .send()
            .await
            .map_err(from_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_status(status.as_u16(), &body))
        }
    }

    async fn invoke(&self, request: &AdapterRequest) -> Result<NormalizedResponse, ProviderError> {
        let body = build_body(request);
        debug!(model = %body.model, "Sending request to Ollama");

        let response: ChatResponse = send_json(
            ProviderId::Ollama,
            self.client
                .post(endpoint(&self.base_url, "api/chat"))
                .json(&body),
        )
        .await?;

        Ok(normalize(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::ChatMessage;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AdapterRequest {
        AdapterRequest {
            messages: vec![
                ChatMessage::system("You are a local assistant."),
                ChatMessage::user("ping"),
            ],
            model: "llama3.3:70b".into(),
            tools: Vec::new(),
            max_output_tokens: 64,
            temperature: 0.0,
        }
    }

    #[test]
    fn test_body_collapses_roles() {
        let body = serde_json::to_value(build_body(&request())).unwrap();
        assert_eq!(body["model"], "llama3.3:70b");
        assert_eq!(body["stream"], false);
        assert_eq!(
            body["messages"],
            json!([{"role": "user", "content": "You are a local assistant.\n\nping"}])
        );
        assert_eq!(body["options"]["num_predict"], 64);
    }

    #[test]
    fn test_namespaced_model_is_sent_unchanged() {
        let mut request = request();
        request.model = "hf.co/bartowski/Llama-3.2-3B-Instruct-GGUF:Q4_K_M".into();
        let body = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(body["model"], "hf.co/bartowski/Llama-3.2-3B-Instruct-GGUF:Q4_K_M");
    }

    #[tokio::test]
    async fn test_invoke_without_eval_counts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.3:70b",
                "message": {"role": "assistant", "content": "pong"},
                "done": true
            })))
            .mount(&server)
            .await;

        let adapter = OllamaAdapter::new().with_base_url(server.uri());
        let response = adapter.invoke(&request()).await.unwrap();
        assert_eq!(response.content, "pong");
        assert_eq!(response.usage, Usage { input_tokens: 0, output_tokens: 0 });
    }

    #[tokio::test]
    async fn test_tool_calls_are_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "",
                    "tool_calls": [{"function": {"name": "get_time", "arguments": {"tz": "UTC"}}}]},
                "prompt_eval_count": 12,
                "eval_count": 3
            })))
            .mount(&server)
            .await;

        let adapter = OllamaAdapter::new().with_base_url(server.uri());
        let response = adapter.invoke(&request()).await.unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "get_time");
        assert_eq!(response.tool_calls[0].arguments, json!({"tz": "UTC"}));
        assert_eq!(response.usage, Usage::new(12, 3));
    }

    #[tokio::test]
    async fn test_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .mount(&server)
            .await;

        let adapter = OllamaAdapter::new().with_base_url(server.uri());
        assert!(adapter.probe().await.is_ok());

        let unreachable = OllamaAdapter::new()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(500));
        assert!(unreachable.probe().await.is_err());
    }
}
