// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media understanding trait (image captioning, audio/video transcription).

use async_trait::async_trait;

use crate::error::VigilError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Modality;

/// Adapter for deriving text from media references.
///
/// Consumed opportunistically during ingest: a caption failure yields `None`
/// at the call site, never a pipeline failure.
#[async_trait]
pub trait MediaUnderstanding: PluginAdapter {
    /// Return a caption (images) or transcript (audio/video) for a media
    /// reference, or `None` when the media cannot be described.
    async fn describe(
        &self,
        media_ref: &str,
        modality: Modality,
    ) -> Result<Option<String>, VigilError>;
}
