// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classifier provider for deterministic testing.
//!
//! Responses are popped from a FIFO queue, so tests can script a Tier-1
//! verdict followed by a Tier-2 verdict followed by a fallback verdict.
//! Errors can be queued to exercise the retryable/fatal paths.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::VigilError;
use vigil_core::traits::adapter::PluginAdapter;
use vigil_core::traits::provider::ClassifierProvider;
use vigil_core::types::{
    AdapterType, ClassifyRequest, ClassifyResponse, HealthStatus, TokenUsage,
};

/// A scripted response: either model text or a provider error.
pub type ScriptedResponse = Result<String, VigilError>;

/// A mock classifier provider returning pre-configured responses in order.
///
/// When the queue is empty, a default `"mock response"` text is returned
/// (which no verdict parser accepts, making queue exhaustion visible in
/// tests as a soft failure).
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<ClassifyRequest>>>,
}

impl MockProvider {
    /// Create a mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with response texts.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        {
            let queue = provider.responses.clone();
            let mut queue = queue.try_lock().expect("fresh mutex");
            for text in responses {
                queue.push_back(Ok(text));
            }
        }
        provider
    }

    /// Queue a response text.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a provider error.
    pub async fn push_error(&self, err: VigilError) {
        self.responses.lock().await.push_back(Err(err));
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<ClassifyRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of calls received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierProvider for MockProvider {
    async fn complete(&self, request: ClassifyRequest) -> Result<ClassifyResponse, VigilError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);

        let next = self.responses.lock().await.pop_front();
        let text = match next {
            Some(Ok(text)) => text,
            Some(Err(err)) => return Err(err),
            None => "mock response".to_string(),
        };

        Ok(ClassifyResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content: text,
            model,
            stop_reason: Some("end_turn".to_string()),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ClassifyRequest {
        ClassifyRequest {
            model: "test-model".into(),
            system_prompt: None,
            user_content: "x".into(),
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn responses_returned_in_order() {
        let provider = MockProvider::with_responses(vec!["first".into(), "second".into()]);
        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert_eq!(provider.complete(request()).await.unwrap().content, "second");
        // Queue exhausted, falls back to default.
        assert_eq!(
            provider.complete(request()).await.unwrap().content,
            "mock response"
        );
    }

    #[tokio::test]
    async fn queued_errors_are_returned() {
        let provider = MockProvider::new();
        provider
            .push_error(VigilError::RateLimited {
                message: "429".into(),
            })
            .await;
        let err = provider.complete(request()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let provider = MockProvider::with_responses(vec!["a".into()]);
        provider.complete(request()).await.unwrap();
        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
    }
}
