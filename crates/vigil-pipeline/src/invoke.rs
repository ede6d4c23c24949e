// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Centralized classifier invocation.
//!
//! Every tier calls the provider through this one helper: a fixed per-call
//! timeout and a single three-way outcome. Retryable outcomes fail soft --
//! the next scheduler tick or message trigger is the retry mechanism, and no
//! caller may loop on a retryable outcome within the same invocation.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use vigil_core::types::{ClassifyRequest, ClassifyResponse};
use vigil_core::{ClassifierProvider, VigilError};

/// Outcome of one classifier call.
#[derive(Debug)]
pub enum CallOutcome {
    /// The call completed and returned a response.
    Completed(ClassifyResponse),
    /// Transient failure (rate limit, outage, timeout); retry on a later tick.
    Retryable(String),
    /// Non-transient failure; replaying the call would fail identically.
    Fatal(VigilError),
}

/// Slice the JSON document out of a model response.
///
/// Models occasionally wrap the requested JSON in code fences or prose; the
/// parsers only see the outermost `{..}` span.
pub(crate) fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Invoke the provider with a per-call timeout and classify the result.
pub async fn call_classifier(
    provider: &Arc<dyn ClassifierProvider>,
    request: ClassifyRequest,
    timeout: Duration,
) -> CallOutcome {
    let model = request.model.clone();
    match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(Ok(response)) => CallOutcome::Completed(response),
        Ok(Err(err)) if err.is_retryable() => {
            warn!(model, error = %err, "classifier call failed soft");
            CallOutcome::Retryable(err.to_string())
        }
        Ok(Err(err)) => CallOutcome::Fatal(err),
        Err(_) => {
            warn!(model, timeout_secs = timeout.as_secs(), "classifier call timed out");
            CallOutcome::Retryable(format!(
                "call timed out after {}s",
                timeout.as_secs()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vigil_core::types::{AdapterType, HealthStatus, TokenUsage};
    use vigil_core::PluginAdapter;

    /// Provider stub with a scripted single behavior.
    struct StubProvider {
        behavior: Behavior,
    }

    enum Behavior {
        Ok,
        RateLimited,
        Fatal,
        Hang,
    }

    #[async_trait]
    impl PluginAdapter for StubProvider {
        fn name(&self) -> &str {
            "stub"
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
    impl ClassifierProvider for StubProvider {
        async fn complete(
            &self,
            request: ClassifyRequest,
        ) -> Result<ClassifyResponse, VigilError> {
            match self.behavior {
                Behavior::Ok => Ok(ClassifyResponse {
                    id: "r1".into(),
                    content: "{}".into(),
                    model: request.model,
                    stop_reason: Some("end_turn".into()),
                    usage: TokenUsage::default(),
                }),
                Behavior::RateLimited => Err(VigilError::RateLimited {
                    message: "429".into(),
                }),
                Behavior::Fatal => Err(VigilError::Provider {
                    message: "401 unauthorized".into(),
                    source: None,
                }),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }
    }

    fn request() -> ClassifyRequest {
        ClassifyRequest {
            model: "claude-haiku-4-5-20250901".into(),
            system_prompt: None,
            user_content: "x".into(),
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn success_is_completed() {
        let provider: Arc<dyn ClassifierProvider> = Arc::new(StubProvider {
            behavior: Behavior::Ok,
        });
        let outcome = call_classifier(&provider, request(), Duration::from_secs(5)).await;
        assert!(matches!(outcome, CallOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn rate_limit_is_retryable() {
        let provider: Arc<dyn ClassifierProvider> = Arc::new(StubProvider {
            behavior: Behavior::RateLimited,
        });
        let outcome = call_classifier(&provider, request(), Duration::from_secs(5)).await;
        assert!(matches!(outcome, CallOutcome::Retryable(_)));
    }

    #[tokio::test]
    async fn auth_failure_is_fatal() {
        let provider: Arc<dyn ClassifierProvider> = Arc::new(StubProvider {
            behavior: Behavior::Fatal,
        });
        let outcome = call_classifier(&provider, request(), Duration::from_secs(5)).await;
        assert!(matches!(outcome, CallOutcome::Fatal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn hang_times_out_as_retryable() {
        let provider: Arc<dyn ClassifierProvider> = Arc::new(StubProvider {
            behavior: Behavior::Hang,
        });
        let outcome = call_classifier(&provider, request(), Duration::from_secs(45)).await;
        match outcome {
            CallOutcome::Retryable(reason) => assert!(reason.contains("timed out")),
            other => panic!("expected retryable timeout, got {other:?}"),
        }
    }
}
