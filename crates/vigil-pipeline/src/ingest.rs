// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message ingestion path.
//!
//! Accepts normalized messages pushed by the ingestion collaborator, derives
//! captions for media opportunistically, runs the pre-filter inline, and
//! routes each message: `immediate` messages go synchronously to Tier-1,
//! `batch` messages are appended to the conversation's pending batch for the
//! next scheduled pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vigil_core::{Modality, SenderRole, Tier, VigilError};
use vigil_storage::models::{Chat, MessageRow, current_month_key, now_iso};
use vigil_storage::queries::{chats, checkpoints, messages, subjects};

use crate::Pipeline;
use crate::prefilter::RoutePriority;
use crate::small::SmallScanResult;

/// A normalized message as delivered by the ingestion collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Message id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub chat_id: String,
    pub subject_id: String,
    /// Human-readable chat label.
    #[serde(default)]
    pub chat_label: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub platform: Option<String>,
    pub sender_role: SenderRole,
    #[serde(default = "default_modality")]
    pub modality: Modality,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_ref: Option<String>,
    /// ISO 8601 send time; ingestion time when absent.
    #[serde(default)]
    pub sent_at: Option<String>,
}

fn default_modality() -> Modality {
    Modality::Text
}

/// Outcome of one ingest call.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestReport {
    /// Messages persisted.
    pub accepted: usize,
    /// Messages dropped (unknown subject or monitoring disabled).
    pub skipped: usize,
    /// Messages routed synchronously to Tier-1.
    pub immediate: usize,
    /// Messages appended to a pending batch.
    pub batched: usize,
    /// Conversations whose immediate Tier-1 pass escalated to Tier-2.
    pub escalated_chats: usize,
}

impl Pipeline {
    /// Ingest a batch of normalized messages.
    ///
    /// Per-message failures of the media collaborator are absorbed; a null
    /// caption is not a pipeline failure.
    pub async fn ingest(
        &self,
        incoming: Vec<IncomingMessage>,
    ) -> Result<IngestReport, VigilError> {
        let mut report = IngestReport::default();
        let mut immediate_by_chat: HashMap<String, (Chat, Vec<MessageRow>)> = HashMap::new();

        for msg in incoming {
            let Some(subject) = subjects::get_subject(&self.db, &msg.subject_id).await? else {
                debug!(subject_id = %msg.subject_id, "ingest skipped: unknown subject");
                report.skipped += 1;
                continue;
            };
            if !subject.monitoring_enabled {
                debug!(subject_id = %msg.subject_id, "ingest skipped: monitoring disabled");
                report.skipped += 1;
                continue;
            }

            let created_at = msg.sent_at.clone().unwrap_or_else(now_iso);
            let chat = Chat {
                id: msg.chat_id.clone(),
                subject_id: msg.subject_id.clone(),
                label: msg.chat_label.clone().unwrap_or_default(),
                is_group: msg.is_group,
                platform: msg.platform.clone().unwrap_or_default(),
                last_activity_at: Some(created_at.clone()),
            };
            chats::upsert_chat(&self.db, &chat).await?;

            let mut row = MessageRow {
                id: msg.id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                chat_id: msg.chat_id.clone(),
                subject_id: msg.subject_id.clone(),
                sender_role: msg.sender_role.to_string(),
                modality: msg.modality.to_string(),
                body: msg.text.clone(),
                caption: msg.caption.clone(),
                media_ref: msg.media_ref.clone(),
                created_at,
            };
            messages::insert_message(&self.db, &row).await?;
            checkpoints::record_activity(&self.db, &row.chat_id, &row.created_at).await?;
            report.accepted += 1;

            // Opportunistic caption backfill for media without one.
            if row.caption.is_none()
                && let Some(media_ref) = &msg.media_ref
                && msg.modality != Modality::Text
            {
                match self.media.describe(media_ref, msg.modality).await {
                    Ok(Some(caption)) => {
                        messages::set_caption(&self.db, &row.id, &caption).await?;
                        if let Err(e) = self
                            .budget
                            .ledger()
                            .record_cost(&row.subject_id, &current_month_key(), Tier::Caption, 0.0)
                            .await
                        {
                            warn!(error = %e, "failed to count caption call");
                        }
                        row.caption = Some(caption);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(media_ref, error = %e, "caption derivation failed, continuing without");
                    }
                }
            }

            let analysis_text = match (&row.body, &row.caption) {
                (Some(body), Some(caption)) => format!("{body} {caption}"),
                _ => row.text_for_analysis().to_string(),
            };
            let hit = self.prefilter.evaluate(&analysis_text);

            match hit.priority {
                RoutePriority::Immediate => {
                    report.immediate += 1;
                    immediate_by_chat
                        .entry(row.chat_id.clone())
                        .or_insert_with(|| (chat, Vec::new()))
                        .1
                        .push(row);
                }
                RoutePriority::Batch => {
                    report.batched += 1;
                    checkpoints::append_pending(&self.db, &row.chat_id, &row.id).await?;
                }
            }
        }

        // Forward immediate messages synchronously, one Tier-1 pass per chat.
        for (chat_id, (chat, rows)) in immediate_by_chat {
            match self.run_small(&chat, &rows).await {
                Ok(SmallScanResult::Completed { escalated: true, .. }) => {
                    report.escalated_chats += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(chat_id = %chat_id, error = %e, "immediate tier-1 pass failed");
                }
            }
        }

        Ok(report)
    }
}
