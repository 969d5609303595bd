//! Display-safe config snapshots with credentials masked.

use serde_json::Value;

use routeforge_logging::mask_secret;

use crate::schema::RouteForgeConfig;

static SENSITIVE_KEYS: &[&str] = &["apiKey", "api_key", "token", "secret", "password"];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Mask every sensitive string field in a JSON tree.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => Value::String(mask_secret(s)),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

impl RouteForgeConfig {
    /// The config as JSON with every credential masked.
    pub fn redacted(&self) -> Value {
        // Serializing a plain struct with string map keys cannot fail.
        serde_json::to_value(self)
            .map(|v| redact(&v))
            .unwrap_or(Value::Null)
    }
}
