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
use crate::translate::{function_tools, parse_arguments};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI Chat Completions adapter.
pub struct OpenAiAdapter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiAdapter {
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

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: Option<String>,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn build_body(request: &AdapterRequest) -> CompletionRequest<'_> {
    let messages = request
        .messages
        .iter()
        .map(|m| WireMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        })
        .collect();

    CompletionRequest {
        model: &request.model,
        messages,
        max_tokens: request.max_output_tokens,
        temperature: request.temperature,
        tools: function_tools(&request.tools),
    }
}

fn normalize(response: CompletionResponse) -> Result<NormalizedResponse, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("response contained no choices".into()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: parse_arguments(&call.function.arguments),
        })
        .collect();

    let usage = response
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(NormalizedResponse {
        content: choice.message.content.unwrap_or_default(),
        usage,
        tool_calls,
        warnings: Vec::new(),
    })
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, request: &AdapterRequest) -> Result<NormalizedResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(ProviderId::OpenAi))?;

        let body = build_body(request);
        debug!(model = %request.model, tools = body.tools.len(), "Sending request to OpenAI");

        let response: CompletionResponse = send_json(
            ProviderId::OpenAi,
            self.client
                .post(endpoint(&self.base_url, "chat/completions"))
                .bearer_auth(api_key)
                .json(&body),
        )
        .await?;

        normalize(response)
    }
}
