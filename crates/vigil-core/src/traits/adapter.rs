// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait implemented by every pluggable collaborator.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::types::{AdapterType, HealthStatus};

/// Common lifecycle contract for all adapters (provider, storage, notifier, media).
#[async_trait]
pub trait PluginAdapter: Send + Sync {
    /// Unique adapter name (e.g. "anthropic", "sqlite", "webhook").
    fn name(&self) -> &str;

    /// Adapter implementation version.
    fn version(&self) -> semver::Version;

    /// What kind of adapter this is.
    fn adapter_type(&self) -> AdapterType;

    /// Check whether the adapter is operational.
    async fn health_check(&self) -> Result<HealthStatus, VigilError>;

    /// Release resources held by the adapter.
    async fn shutdown(&self) -> Result<(), VigilError>;
}
