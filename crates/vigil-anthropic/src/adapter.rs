// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ClassifierProvider implementation over the Anthropic client.

use async_trait::async_trait;

use vigil_core::traits::adapter::PluginAdapter;
use vigil_core::traits::provider::ClassifierProvider;
use vigil_core::types::{
    AdapterType, ClassifyRequest, ClassifyResponse, HealthStatus, TokenUsage,
};
use vigil_core::VigilError;

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic-backed classifier provider.
///
/// One adapter serves all three cost tiers; the caller picks the model per
/// request.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Create a provider over a configured client.
    pub fn new(client: AnthropicClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        // No cheap unauthenticated ping exists; a constructed client with
        // valid headers is considered healthy until a call says otherwise.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierProvider for AnthropicProvider {
    async fn complete(&self, request: ClassifyRequest) -> Result<ClassifyResponse, VigilError> {
        let api_request = MessageRequest {
            model: request.model,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.user_content,
            }],
            system: request.system_prompt,
            max_tokens: request.max_tokens,
        };

        let response = self.client.complete_message(&api_request).await?;

        Ok(ClassifyResponse {
            id: response.id.clone(),
            content: response.text(),
            model: response.model.clone(),
            stop_reason: response.stop_reason.clone(),
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_maps_request_and_response() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "{\"escalate\": true}"}],
            "model": "claude-haiku-4-5-20250901",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 42, "output_tokens": 7}
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-haiku-4-5-20250901",
                "system": "Classify strictly."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("key".into(), "2023-06-01".into())
            .unwrap()
            .with_base_url(server.uri());
        let provider = AnthropicProvider::new(client);

        let response = provider
            .complete(ClassifyRequest {
                model: "claude-haiku-4-5-20250901".into(),
                system_prompt: Some("Classify strictly.".into()),
                user_content: "messages here".into(),
                max_tokens: 256,
            })
            .await
            .unwrap();

        assert_eq!(response.content, "{\"escalate\": true}");
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 7);
    }

    #[test]
    fn adapter_identity() {
        let client = AnthropicClient::new("key".into(), "2023-06-01".into()).unwrap();
        let provider = AnthropicProvider::new(client);
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
    }
}
