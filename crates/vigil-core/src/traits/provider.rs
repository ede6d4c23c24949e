// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier provider trait for the three model cost tiers.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ClassifyRequest, ClassifyResponse};

/// Adapter for classifier model providers.
///
/// One implementation serves all three cost tiers; the tier is expressed by
/// the model identifier on the request. Calls are strictly non-streaming:
/// classification output is a single JSON document. Implementations perform
/// exactly one attempt per call and map transport failures onto the
/// retryable/fatal variants of [`VigilError`] -- retry policy belongs to the
/// scheduler, never to the client.
#[async_trait]
pub trait ClassifierProvider: PluginAdapter {
    /// Send a classification request and return the full response.
    async fn complete(&self, request: ClassifyRequest) -> Result<ClassifyResponse, VigilError>;
}
