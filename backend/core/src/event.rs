use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ProviderId, TaskCategory, Usage};

/// Value of `event_type` for every routing outcome.
pub const CHAT_EVENT_TYPE: &str = "chat";

/// Outcome metadata for one provider attempt, emitted to the analytics sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub task_category: TaskCategory,
    pub provider_used: Option<ProviderId>,
    pub model_name: Option<String>,
    pub response_time_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl OutcomeEvent {
    pub fn success(
        task_category: TaskCategory,
        provider: ProviderId,
        model_name: impl Into<String>,
        response_time_ms: u64,
        usage: Usage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: CHAT_EVENT_TYPE.to_string(),
            task_category,
            provider_used: Some(provider),
            model_name: Some(model_name.into()),
            response_time_ms,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            success: true,
            error_message: None,
        }
    }

    pub fn failure(
        task_category: TaskCategory,
        provider: Option<ProviderId>,
        model_name: Option<String>,
        response_time_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: CHAT_EVENT_TYPE.to_string(),
            task_category,
            provider_used: provider,
            model_name,
            response_time_ms,
            input_tokens: 0,
            output_tokens: 0,
            success: false,
            error_message: Some(error_message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_event() {
        let event = OutcomeEvent::success(
            TaskCategory::Code,
            ProviderId::Anthropic,
            "claude-sonnet-4-5",
            120,
            Usage::new(10, 20),
        );
        assert_eq!(event.event_type, "chat");
        assert!(event.success);
        assert_eq!(event.input_tokens, 10);
        assert_eq!(event.output_tokens, 20);
        assert!(event.error_message.is_none());
    }

    #[test]
    fn test_failure_event_serialization() {
        let event = OutcomeEvent::failure(
            TaskCategory::Chat,
            Some(ProviderId::OpenAi),
            None,
            15,
            "rate limited",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "chat");
        assert_eq!(json["task_category"], "chat");
        assert_eq!(json["provider_used"], "openai");
        assert_eq!(json["success"], false);
        assert_eq!(json["error_message"], "rate limited");
        let back: OutcomeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
