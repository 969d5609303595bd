//! Log Redaction Layer
//!
//! Scrubs API keys and bearer tokens from strings before they are logged or
//! surfaced in error messages.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-(?:ant-)?[a-zA-Z0-9_\-]{16,})|(AIza[0-9A-Za-z_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)")
        .expect("static regex")
});

static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&]key=)[^&\s]+").expect("static regex"));

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    KEY_PARAM_RE
        .replace_all(&redacted, "${1}[REDACTED_TOKEN]")
        .into_owned()
}

/// Mask a credential for display, keeping at most the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
