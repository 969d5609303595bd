//! CLI Chat Command
//!
//! Sends one prompt through the router and prints the answer.

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use routeforge_config::RouteForgeConfig;
use routeforge_core::{ChatMessage, ChatRequest, ProviderId, TaskCategory};

use crate::terminal_output::{dim, note_error, note_warn};

pub struct ChatArgs {
    pub prompt: String,
    pub category: TaskCategory,
    pub provider: Option<ProviderId>,
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ChatArgs {
    fn into_request(self) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(self.prompt));

        let mut request = ChatRequest::new(self.category, messages);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_output_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(provider) = self.provider {
            request = request.with_preferred_provider(provider);
        }
        request
    }
}

pub async fn run(config: &RouteForgeConfig, args: ChatArgs) -> Result<()> {
    let (reporter, recorder) = crate::analytics_reporter(config)?;
    let router = crate::bootstrap::build_router(config, reporter).await?;

    // Ctrl-C aborts the in-flight attempt and stops fallback.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = router.chat_with_cancel(args.into_request(), &cancel).await;

    // Dropping the router closes the outcome channel so the recorder can finish.
    drop(router);
    if let Err(e) = recorder.await {
        warn!(error = %e, "Analytics recorder did not shut down cleanly");
    }

    if let Some(error) = &result.error {
        note_error(&error.message);
        bail!("chat failed: {:?}", error.kind);
    }

    for warning in &result.warnings {
        note_warn(warning);
    }
    println!("{}", result.content);
    for call in &result.tool_calls {
        println!("{}", dim(&format!("tool call: {} {}", call.name, call.arguments)));
    }
    println!(
        "{}",
        dim(&format!(
            "via {} ({}), {} in, {} out",
            result.provider_used.map(|p| p.as_str()).unwrap_or("?"),
            result.model_name.as_deref().unwrap_or("?"),
            result.usage.input_tokens,
            result.usage.output_tokens,
        ))
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::Role;

    #[test]
    fn test_args_build_request() {
        let request = ChatArgs {
            prompt: "Refactor this".into(),
            category: TaskCategory::Code,
            provider: Some(ProviderId::Ollama),
            system: Some("Be brief.".into()),
            max_tokens: Some(256),
            temperature: None,
        }
        .into_request();

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content, "Refactor this");
        assert_eq!(request.max_output_tokens, 256);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.preferred_provider, Some(ProviderId::Ollama));
        assert!(request.validate().is_ok());
    }
}
