use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use routeforge_core::{AdapterRequest, NormalizedResponse, ProviderAdapter, ProviderError, ProviderId, Usage};

/// A scripted provider for tests and dry runs.
///
/// Each invocation pops the next scripted outcome; once the script is empty the
/// fixed response (or a canned default) is returned.
pub struct MockProvider {
    id: ProviderId,
    fixed_response: Option<String>,
    script: Mutex<VecDeque<Result<NormalizedResponse, ProviderError>>>,
    delay: Option<Duration>,
    credentials: bool,
    probe_result: Result<(), ProviderError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<AdapterRequest>>,
}

impl MockProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            delay: None,
            credentials: true,
            probe_result: Ok(()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Queue a failure for the next invocation.
    pub fn failing(self, error: ProviderError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue a full response for the next invocation.
    pub fn then(self, response: NormalizedResponse) -> Self {
        self.push(Ok(response));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn with_probe_result(mut self, result: Result<(), ProviderError>) -> Self {
        self.probe_result = result;
        self
    }

    /// Number of `invoke` calls so far, including ones cut short by cancellation.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<AdapterRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, outcome: Result<NormalizedResponse, ProviderError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        self.probe_result.clone()
    }

    async fn invoke(&self, request: &AdapterRequest) -> Result<NormalizedResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| {
            Ok(NormalizedResponse {
                content: self
                    .fixed_response
                    .clone()
                    .unwrap_or_else(|| format!("Mock response from {}", self.id)),
                usage: Usage::default(),
                tool_calls: Vec::new(),
                warnings: Vec::new(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::ChatMessage;

    fn request() -> AdapterRequest {
        AdapterRequest {
            messages: vec![ChatMessage::user("hi")],
            model: "mock".into(),
            tools: Vec::new(),
            max_output_tokens: 16,
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn test_script_then_fixed_response() {
        let mock = MockProvider::new(ProviderId::OpenAi)
            .with_response("steady")
            .failing(ProviderError::Timeout);

        assert_eq!(mock.invoke(&request()).await.unwrap_err(), ProviderError::Timeout);
        assert_eq!(mock.invoke(&request()).await.unwrap().content, "steady");
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.requests().len(), 2);
    }
}
