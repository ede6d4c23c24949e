// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guardian notification trait.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GuardianNotice;

/// Adapter for outbound guardian notification delivery.
///
/// Delivery is best-effort by contract: the finding row is the durable source
/// of truth, and callers log (never propagate) a delivery failure.
#[async_trait]
pub trait Notifier: PluginAdapter {
    /// Deliver a notice derived from a persisted finding.
    async fn notify(&self, notice: &GuardianNotice) -> Result<(), VigilError>;
}
