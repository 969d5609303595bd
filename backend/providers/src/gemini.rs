//! Gemini `generateContent` with Google Search grounding.
//!
//! The grounded endpoint only knows two roles (`user`, `model`) and cannot be
//! combined with function declarations, so tools are dropped with a warning
//! and `tool_calls` is always empty.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use routeforge_core::{AdapterRequest, NormalizedResponse, ProviderAdapter, ProviderError, ProviderId, Usage};

use crate::http::{build_client, endpoint, send_json, DEFAULT_TIMEOUT};
use crate::translate::{collapse_roles, Turn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini adapter with search grounding enabled on every call.
pub struct GeminiAdapter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiAdapter {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    tools: Vec<Value>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

fn build_body(request: &AdapterRequest) -> GenerateRequest {
    let contents = collapse_roles(&request.messages)
        .into_iter()
        .map(|(turn, text)| Content {
            role: match turn {
                Turn::Input => "user".to_string(),
                Turn::Output => "model".to_string(),
            },
            parts: vec![Part { text }],
        })
        .collect();

    GenerateRequest {
        contents,
        tools: vec![json!({"google_search": {}})],
        generation_config: GenerationConfig {
            max_output_tokens: request.max_output_tokens,
            temperature: request.temperature,
        },
    }
}

fn normalize(response: GenerateResponse) -> Result<NormalizedResponse, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("response contained no candidates".into()))?;

    let content = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    let usage = response
        .usage_metadata
        .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    Ok(NormalizedResponse {
        content,
        usage,
        tool_calls: Vec::new(),
        warnings: Vec::new(),
    })
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, request: &AdapterRequest) -> Result<NormalizedResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(ProviderId::Gemini))?;

        let body = build_body(request);
        debug!(model = %request.model, turns = body.contents.len(), "Sending request to Gemini");

        let url = endpoint(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", request.model),
        );
        let response: GenerateResponse = send_json(
            ProviderId::Gemini,
            self.client
                .post(url)
                .header("x-goog-api-key", api_key)
                .json(&body),
        )
        .await?;

        let mut normalized = normalize(response)?;
        if !request.tools.is_empty() {
            warn!(tools = request.tools.len(), "Gemini grounded search ignores function tools");
            normalized.warnings.push(format!(
                "gemini search grounding does not support function calling; {} tool(s) were not sent",
                request.tools.len()
            ));
        }
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::{ChatMessage, ToolSpec};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AdapterRequest {
        AdapterRequest {
            messages: vec![
                ChatMessage::system("Cite your sources.\n\tKeep it short."),
                ChatMessage::user("Who won the 2022 World Cup?"),
                ChatMessage::assistant("Argentina."),
                ChatMessage::user("Who scored in the final?"),
            ],
            model: "gemini-2.0-flash".into(),
            tools: Vec::new(),
            max_output_tokens: 300,
            temperature: 0.3,
        }
    }

    #[test]
    fn test_roles_collapse_to_user_and_model() {
        let body = serde_json::to_value(build_body(&request())).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(
            contents[0]["parts"][0]["text"],
            "Cite your sources.\n\tKeep it short.\n\nWho won the 2022 World Cup?"
        );
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(body["tools"][0], json!({"google_search": {}}));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 300);
    }

    #[test]
    fn test_normalize_without_usage_metadata() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Messi "}, {"text": "and Mbappé."}]}}]
        }))
        .unwrap();
        let normalized = normalize(response).unwrap();
        assert_eq!(normalized.content, "Messi and Mbappé.");
        assert_eq!(normalized.usage, Usage::default());
        assert!(normalized.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_tools_dropped_with_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Messi scored twice."}]}}],
                "usageMetadata": {"promptTokenCount": 21, "candidatesTokenCount": 6, "totalTokenCount": 27}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request();
        req.tools.push(ToolSpec {
            name: "lookup".into(),
            description: "Lookup".into(),
            input_schema: json!({"type": "object"}),
        });

        let adapter = GeminiAdapter::new(Some("g-key".into())).with_base_url(server.uri());
        let response = adapter.invoke(&req).await.unwrap();
        assert_eq!(response.content, "Messi scored twice.");
        assert_eq!(response.usage, Usage::new(21, 6));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let adapter = GeminiAdapter::new(None);
        assert!(!adapter.has_credentials());
        assert_eq!(
            adapter.invoke(&request()).await.unwrap_err(),
            ProviderError::NotConfigured(ProviderId::Gemini)
        );
    }
}
