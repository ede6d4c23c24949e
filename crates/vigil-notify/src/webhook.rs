// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook-based guardian notifier.
//!
//! Posts the notice as JSON to a configured endpoint. Delivery is best-effort
//! by contract; callers treat errors as log-and-continue.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use vigil_core::VigilError;
use vigil_core::traits::adapter::PluginAdapter;
use vigil_core::traits::notifier::Notifier;
use vigil_core::types::{AdapterType, GuardianNotice, HealthStatus};

/// Posts guardian notices to a webhook URL with optional bearer auth.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    bearer_token: Option<String>,
}

impl WebhookNotifier {
    /// Create a webhook notifier for the given endpoint.
    pub fn new(url: String, bearer_token: Option<String>) -> Result<Self, VigilError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| VigilError::Notification {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url,
            bearer_token,
        })
    }
}

#[async_trait]
impl PluginAdapter for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &GuardianNotice) -> Result<(), VigilError> {
        let mut request = self.client.post(&self.url).json(notice);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| VigilError::Notification {
            message: format!("webhook delivery failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VigilError::Notification {
                message: format!("webhook returned {status}"),
                source: None,
            });
        }

        debug!(finding_id = %notice.finding_id, "guardian notice delivered");
        Ok(())
    }
}

/// Logs notices instead of delivering them.
///
/// Default notifier for deployments without a configured webhook: the finding
/// row remains the durable record either way.
pub struct LogNotifier;

#[async_trait]
impl PluginAdapter for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &GuardianNotice) -> Result<(), VigilError> {
        info!(
            subject_id = %notice.subject_id.0,
            finding_id = %notice.finding_id,
            risk_level = %notice.risk_level,
            explanation = %notice.explanation,
            "guardian notice (no webhook configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{RiskLevel, ThreatType};
    use vigil_core::types::SubjectId;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notice() -> GuardianNotice {
        GuardianNotice {
            subject_id: SubjectId("s1".into()),
            finding_id: "f1".into(),
            risk_level: RiskLevel::High,
            threat_types: vec![ThreatType::Grooming],
            explanation: "age gap probing".into(),
        }
    }

    #[tokio::test]
    async fn delivers_json_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({
                "finding_id": "f1",
                "risk_level": "high"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(format!("{}/hook", server.uri()), Some("secret".into())).unwrap();
        notifier.notify(&notice()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()), None).unwrap();
        let err = notifier.notify(&notice()).await.unwrap_err();
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier.notify(&notice()).await.unwrap();
    }
}
