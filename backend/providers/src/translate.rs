//! Message and tool translation shared by several adapters.

use serde_json::{json, Value};

use routeforge_core::{ChatMessage, Role, ToolSpec};

/// Separator used when several canonical messages fold into one provider turn.
pub(crate) const TURN_SEPARATOR: &str = "\n\n";

/// Side of a two-role conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Turn {
    /// Anything the model did not say: system and user messages.
    Input,
    /// Assistant messages.
    Output,
}

/// Collapse the three canonical roles onto a two-role vocabulary.
///
/// System and user messages both become `Input`. Adjacent messages landing on
/// the same side are merged, in order, with their text kept verbatim.
pub(crate) fn collapse_roles(messages: &[ChatMessage]) -> Vec<(Turn, String)> {
    let mut turns: Vec<(Turn, String)> = Vec::with_capacity(messages.len());
    for message in messages {
        let turn = match message.role {
            Role::Assistant => Turn::Output,
            Role::System | Role::User => Turn::Input,
        };
        match turns.last_mut() {
            Some((last, text)) if *last == turn => {
                text.push_str(TURN_SEPARATOR);
                text.push_str(&message.content);
            }
            _ => turns.push((turn, message.content.clone())),
        }
    }
    turns
}

/// Pull every system message out into one prompt, leaving the rest in order.
pub(crate) fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let rest = messages.iter().filter(|m| m.role != Role::System).collect();

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join(TURN_SEPARATOR))
    };
    (system, rest)
}

/// Canonical tools in the `{"type": "function", "function": {...}}` schema.
pub(crate) fn function_tools(tools: &[ToolSpec]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

/// Tool arguments arrive as a JSON-encoded string; keep the raw text if it does not parse.
pub(crate) fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
