// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock guardian notifier that records delivered notices.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::VigilError;
use vigil_core::traits::adapter::PluginAdapter;
use vigil_core::traits::notifier::Notifier;
use vigil_core::types::{AdapterType, GuardianNotice, HealthStatus};

/// Records every notice; can be flipped into a failing mode to test that
/// notification failure never rolls back a finding.
pub struct MockNotifier {
    notices: Mutex<Vec<GuardianNotice>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent delivery fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All successfully delivered notices.
    pub async fn notices(&self) -> Vec<GuardianNotice> {
        self.notices.lock().await.clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockNotifier {
    fn name(&self) -> &str {
        "mock-notifier"
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
impl Notifier for MockNotifier {
    async fn notify(&self, notice: &GuardianNotice) -> Result<(), VigilError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VigilError::Notification {
                message: "mock delivery failure".into(),
                source: None,
            });
        }
        self.notices.lock().await.push(notice.clone());
        Ok(())
    }
}
