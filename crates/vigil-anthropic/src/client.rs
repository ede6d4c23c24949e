// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Each call is exactly one attempt. Transient failures (429, 5xx) map onto
//! the retryable [`VigilError`] variants and are surfaced to the caller; the
//! scheduler's next tick is the retry mechanism, never this client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;
use vigil_core::VigilError;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Base URL for the Anthropic Messages API.
const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key for authentication
    /// * `api_version` - API version string (e.g., "2023-06-01")
    pub fn new(api_key: String, api_version: String) -> Result<Self, VigilError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).map_err(|e| {
                VigilError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&api_version).map_err(|e| {
                VigilError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| VigilError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a request and returns the full response. Exactly one attempt.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, VigilError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VigilError::Timeout {
                        duration: Duration::from_secs(120),
                    }
                } else {
                    VigilError::Unavailable {
                        message: format!("HTTP request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        if status.is_success() {
            let body = response.text().await.map_err(|e| VigilError::Provider {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            return serde_json::from_str(&body).map_err(|e| VigilError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|api_err| format!("{}: {}", api_err.error.type_, api_err.error.message))
            .unwrap_or_else(|_| format!("API returned {status}: {body}"));

        match status.as_u16() {
            429 => Err(VigilError::RateLimited { message: detail }),
            500 | 502 | 503 | 529 => Err(VigilError::Unavailable { message: detail }),
            _ => Err(VigilError::Provider {
                message: detail,
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> AnthropicClient {
        AnthropicClient::new("test-api-key".into(), "2023-06-01".into())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> MessageRequest {
        MessageRequest {
            model: "claude-haiku-4-5-20250901".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Classify".into(),
            }],
            system: None,
            max_tokens: 256,
        }
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "{\"escalate\": false}"}],
            "model": "claude-haiku-4-5-20250901",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })
    }

    #[tokio::test]
    async fn complete_message_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_message(&test_request()).await.unwrap();
        assert_eq!(result.id, "msg_test");
        assert_eq!(result.usage.input_tokens, 10);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_retryable_without_retrying() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "rate_limit_error", "message": "Rate limited"}
        });

        // expect(1) verifies the client makes exactly one attempt.
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.complete_message(&test_request()).await.unwrap_err();
        assert!(err.is_retryable(), "429 must be retryable: {err}");
        assert!(matches!(err, VigilError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn overloaded_maps_to_unavailable() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "overloaded_error", "message": "Service overloaded"}
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(529).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.complete_message(&test_request()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, VigilError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn bad_request_is_fatal() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "invalid_request_error", "message": "Bad model"}
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.complete_message(&test_request()).await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn client_sends_correct_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_message(&test_request()).await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }
}
