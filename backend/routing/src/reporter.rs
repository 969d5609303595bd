//! Built-in outcome reporters.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tracing::info;

use routeforge_core::{OutcomeEvent, OutcomeReporter};

/// Writes each outcome as a structured `tracing` event on the `chat_outcomes` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl OutcomeReporter for TracingReporter {
    fn report(&self, event: &OutcomeEvent) -> Result<()> {
        info!(
            target: "chat_outcomes",
            event_type = %event.event_type,
            task_category = %event.task_category,
            provider = event.provider_used.map(|p| p.as_str()).unwrap_or("none"),
            response_time_ms = event.response_time_ms,
            input_tokens = event.input_tokens,
            output_tokens = event.output_tokens,
            success = event.success,
            error = event.error_message.as_deref().unwrap_or(""),
            "Chat outcome"
        );
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl OutcomeReporter for NoopReporter {
    fn report(&self, _event: &OutcomeEvent) -> Result<()> {
        Ok(())
    }
}

/// Hands events to a background consumer without waiting.
///
/// A full or closed channel is reported as an error, which the router logs and drops.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::Sender<OutcomeEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<OutcomeEvent>) -> Self {
        Self { tx }
    }

    /// A reporter plus the receiving end of a channel of the given capacity.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutcomeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl OutcomeReporter for ChannelReporter {
    fn report(&self, event: &OutcomeEvent) -> Result<()> {
        self.tx
            .try_send(event.clone())
            .map_err(|e| anyhow!("outcome channel rejected event: {e}"))
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<OutcomeEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutcomeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutcomeReporter for MemoryReporter {
    fn report(&self, event: &OutcomeEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Forwards to several reporters. Every reporter sees every event; the first
/// error is returned after all have run.
#[derive(Default, Clone)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn OutcomeReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn OutcomeReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

impl OutcomeReporter for FanoutReporter {
    fn report(&self, event: &OutcomeEvent) -> Result<()> {
        let mut first_error = None;
        for reporter in &self.reporters {
            if let Err(e) = reporter.report(event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::{ProviderId, TaskCategory, Usage};

    fn event() -> OutcomeEvent {
        OutcomeEvent::success(TaskCategory::Chat, ProviderId::OpenAi, "gpt-4o", 42, Usage::new(1, 2))
    }

    #[tokio::test]
    async fn test_channel_reporter_delivers() {
        let (reporter, mut rx) = ChannelReporter::channel(4);
        reporter.report(&event()).unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.response_time_ms, 42);
    }

    #[test]
    fn test_channel_reporter_full_is_error() {
        let (reporter, _rx) = ChannelReporter::channel(1);
        reporter.report(&event()).unwrap();
        assert!(reporter.report(&event()).is_err());
    }

    #[test]
    fn test_fanout_reaches_all_despite_error() {
        let memory = Arc::new(MemoryReporter::new());
        let (closed, rx) = ChannelReporter::channel(1);
        drop(rx);

        let fanout = FanoutReporter::new()
            .with(Arc::new(closed))
            .with(memory.clone())
            .with(Arc::new(TracingReporter))
            .with(Arc::new(NoopReporter));

        assert!(fanout.report(&event()).is_err());
        assert_eq!(memory.events().len(), 1);
    }
}
