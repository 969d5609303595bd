use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ParseTagError};

/// Caller-supplied hint used to rank provider preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Code,
    #[default]
    Chat,
    Search,
    Analysis,
    Creative,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::Code,
        TaskCategory::Chat,
        TaskCategory::Search,
        TaskCategory::Analysis,
        TaskCategory::Creative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Code => "code",
            TaskCategory::Chat => "chat",
            TaskCategory::Search => "search",
            TaskCategory::Analysis => "analysis",
            TaskCategory::Creative => "creative",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTagError::new("task category", s))
    }
}

/// Identity of one provider backend. Stable map key for the policy table,
/// availability registry and model-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API.
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini with search grounding.
    Gemini,
    /// Local Ollama daemon.
    Ollama,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Anthropic,
        ProviderId::OpenAi,
        ProviderId::Gemini,
        ProviderId::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Ollama => "ollama",
        }
    }

    /// Local providers are probed for reachability instead of checked for credentials.
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderId::Ollama)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTagError::new("provider", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation. Sequence order is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Function-calling capability descriptor in the canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub input_schema: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Token accounting. Zero when the provider does not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

/// A normalized chat request. Immutable for the duration of routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub task_category: TaskCategory,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<ProviderId>,
}

impl ChatRequest {
    pub fn new(task_category: TaskCategory, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            task_category,
            tools: Vec::new(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            preferred_provider: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_preferred_provider(mut self, provider: ProviderId) -> Self {
        self.preferred_provider = Some(provider);
        self
    }

    /// Check the field constraints. Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("request has no messages".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

/// What the router hands an adapter for a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub tools: Vec<ToolSpec>,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl AdapterRequest {
    pub fn from_chat(request: &ChatRequest, model: impl Into<String>) -> Self {
        Self {
            messages: request.messages.clone(),
            model: model.into(),
            tools: request.tools.clone(),
            max_output_tokens: request.max_output_tokens,
            temperature: request.temperature,
        }
    }
}

/// Provider response translated back into the canonical shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedResponse {
    pub content: String,
    pub usage: Usage,
    pub tool_calls: Vec<ToolCall>,
    /// Request features that were dropped during translation.
    pub warnings: Vec<String>,
}

/// Terminal outcome of one logical `chat()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub provider_used: Option<ProviderId>,
    pub model_name: Option<String>,
    pub usage: Usage,
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub error: Option<ChatError>,
}

impl ChatResult {
    pub fn success(provider: ProviderId, model_name: impl Into<String>, response: NormalizedResponse) -> Self {
        Self {
            content: response.content,
            provider_used: Some(provider),
            model_name: Some(model_name.into()),
            usage: response.usage,
            tool_calls: response.tool_calls,
            warnings: response.warnings,
            error: None,
        }
    }

    /// A failed result. Never carries content or a provider; the last
    /// provider attempted stays on `error.provider`.
    pub fn failure(error: ChatError) -> Self {
        Self {
            content: String::new(),
            provider_used: None,
            model_name: None,
            usage: Usage::default(),
            tool_calls: Vec::new(),
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatErrorKind;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in TaskCategory::ALL {
            assert_eq!(category.as_str().parse::<TaskCategory>().unwrap(), category);
        }
        assert_eq!("  CODE ".parse::<TaskCategory>().unwrap(), TaskCategory::Code);
        assert!("poetry".parse::<TaskCategory>().is_err());
    }

    #[test]
    fn test_provider_serde_names() {
        let json = serde_json::to_string(&ProviderId::ALL).unwrap();
        assert_eq!(json, r#"["anthropic","openai","gemini","ollama"]"#);
        let parsed: ProviderId = serde_json::from_str(r#""openai""#).unwrap();
        assert_eq!(parsed, ProviderId::OpenAi);
        assert!(ProviderId::Ollama.is_local());
        assert!(!ProviderId::Anthropic.is_local());
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"hi"}],"task_category":"search"}"#,
        )
        .unwrap();
        assert_eq!(request.task_category, TaskCategory::Search);
        assert_eq!(request.max_output_tokens, 4096);
        assert!(request.tools.is_empty());
        assert!(request.preferred_provider.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let base = ChatRequest::new(TaskCategory::Chat, vec![ChatMessage::user("hi")]);
        assert!(base.clone().with_max_output_tokens(0).validate().is_err());
        assert!(base.clone().with_temperature(1.5).validate().is_err());
        assert!(base.clone().with_temperature(-0.1).validate().is_err());
        assert!(base.clone().with_temperature(0.0).validate().is_ok());
        assert!(ChatRequest::new(TaskCategory::Chat, vec![]).validate().is_err());
    }

    #[test]
    fn test_failure_carries_no_content() {
        let result = ChatResult::failure(ChatError {
            kind: ChatErrorKind::AllProvidersFailed,
            message: "rate limited".into(),
            provider: Some(ProviderId::OpenAi),
        });
        assert!(!result.is_success());
        assert!(result.content.is_empty());
        assert_eq!(result.usage, Usage::default());
        assert_eq!(result.provider_used, None);
        assert_eq!(result.error.unwrap().provider, Some(ProviderId::OpenAi));
    }

    #[test]
    fn test_usage_always_serialized() {
        let result = ChatResult::success(
            ProviderId::Gemini,
            "gemini-2.0-flash",
            NormalizedResponse {
                content: "hello".into(),
                ..Default::default()
            },
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["usage"]["input_tokens"], 0);
        assert_eq!(value["usage"]["output_tokens"], 0);
        assert!(value["error"].is_null());
    }
}
