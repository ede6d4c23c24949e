// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media-understanding adapter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::VigilError;
use vigil_core::traits::adapter::PluginAdapter;
use vigil_core::traits::media::MediaUnderstanding;
use vigil_core::types::{AdapterType, HealthStatus, Modality};

/// Returns a configurable caption; can be flipped into a failing mode to
/// test that caption failure yields a null caption, not a pipeline failure.
pub struct MockMedia {
    caption: Mutex<Option<String>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockMedia {
    pub fn new() -> Self {
        Self {
            caption: Mutex::new(Some("a photo".to_string())),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set the caption returned for every media reference.
    pub async fn set_caption(&self, caption: Option<String>) {
        *self.caption.lock().await = caption;
    }

    /// Make every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of describe calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockMedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockMedia {
    fn name(&self) -> &str {
        "mock-media"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Media
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl MediaUnderstanding for MockMedia {
    async fn describe(
        &self,
        _media_ref: &str,
        _modality: Modality,
    ) -> Result<Option<String>, VigilError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(VigilError::Internal("mock media failure".into()));
        }
        Ok(self.caption.lock().await.clone())
    }
}
