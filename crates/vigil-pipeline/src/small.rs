// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier-1 batch classifier ("small agent").
//!
//! Classifies an ordered batch of messages with the cheap model, persists one
//! small signal per message, stamps the checkpoint, and escalates the
//! conversation to Tier-2 when the escalation rule fires. Malformed model
//! output is a soft failure: nothing is persisted, nothing escalates, and the
//! checkpoint is left for the next tick to retry.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use vigil_core::types::ClassifyRequest;
use vigil_core::{RiskCode, Tier, VigilError};
use vigil_storage::models::{Chat, MessageRow, SmallSignal, now_iso};
use vigil_storage::queries::{checkpoints, signals, subjects};

use crate::Pipeline;
use crate::invoke::{CallOutcome, call_classifier, extract_json};

/// System instruction for the Tier-1 classifier.
///
/// The risk-code vocabulary here must stay in sync with
/// [`vigil_core::RiskCode`].
const SMALL_SYSTEM_PROMPT: &str = "\
You are a safety classifier reviewing chat messages sent to or by a minor. \
Score each message for risk on a 0-100 scale. Minimize false positives: \
ordinary teenage banter, gaming trash talk, and profanity between peers are \
NOT risks. Real risks are adults or strangers building inappropriate \
closeness, requesting images, arranging meetings, threatening, or isolating \
the minor.\n\
Risk codes (use only these): grooming, secrecy, meetup, sexual_content, \
explicit_imagery, extortion, isolation, personal_info.\n\
Respond with ONLY a JSON object, no prose:\n\
{\"messages\": [{\"message_id\": \"...\", \"risk_score\": 0, \
\"risk_codes\": [], \"escalate\": false}], \"escalate\": false}\n\
Set the batch-level \"escalate\" flag when the batch as a whole warrants \
contextual review even though no single message stands out.";

/// Tier-1 verdict for one message.
#[derive(Debug, Clone)]
pub struct SignalVerdict {
    pub message_id: String,
    /// Risk score, clamped to 0-100.
    pub risk_score: u8,
    pub risk_codes: Vec<RiskCode>,
    pub escalate: bool,
}

/// Tier-1 verdict for a whole batch.
#[derive(Debug, Clone)]
pub struct SmallVerdict {
    pub messages: Vec<SignalVerdict>,
    /// Batch-level escalation flag.
    pub escalate: bool,
}

#[derive(Debug, Deserialize)]
struct RawSmallVerdict {
    messages: Vec<RawSignal>,
    #[serde(default)]
    escalate: bool,
}

#[derive(Debug, Deserialize)]
struct RawSignal {
    message_id: String,
    risk_score: f64,
    #[serde(default)]
    risk_codes: Vec<String>,
    #[serde(default)]
    escalate: bool,
}

/// Parse a strict Tier-1 JSON verdict.
///
/// Unknown risk-code strings are dropped with a warning rather than failing
/// the whole batch; anything structurally wrong is a parse error.
pub fn parse_small_verdict(content: &str) -> Result<SmallVerdict, VigilError> {
    let raw: RawSmallVerdict =
        serde_json::from_str(extract_json(content)).map_err(|e| VigilError::Parse {
            message: format!("tier-1 verdict: {e}"),
        })?;

    let messages = raw
        .messages
        .into_iter()
        .map(|m| {
            let risk_codes = m
                .risk_codes
                .iter()
                .filter_map(|code| match RiskCode::from_str(code) {
                    Ok(code) => Some(code),
                    Err(_) => {
                        warn!(code, "tier-1 returned unknown risk code, dropping");
                        None
                    }
                })
                .collect();
            SignalVerdict {
                message_id: m.message_id,
                risk_score: m.risk_score.clamp(0.0, 100.0) as u8,
                risk_codes,
                escalate: m.escalate,
            }
        })
        .collect();

    Ok(SmallVerdict {
        messages,
        escalate: raw.escalate,
    })
}

/// The Tier-2 escalation rule.
///
/// Escalate when the batch flag is set, OR any risk score reaches the
/// threshold, OR any per-message escalate flag is set, OR any risk code is in
/// the critical subset.
pub fn should_escalate(verdict: &SmallVerdict, escalation_score: u8) -> bool {
    verdict.escalate
        || verdict.messages.iter().any(|m| {
            m.risk_score >= escalation_score
                || m.escalate
                || m.risk_codes.iter().any(RiskCode::is_critical)
        })
}

/// Result of a Tier-1 invocation.
#[derive(Debug)]
pub enum SmallScanResult {
    /// Nothing to do (empty batch, unknown subject, monitoring disabled).
    Skipped,
    /// The call or its parse failed soft; the next tick retries naturally.
    SoftFailure(String),
    /// Signals persisted, checkpoint stamped.
    Completed {
        signals_persisted: usize,
        escalated: bool,
    },
}

fn build_small_request(
    model: &str,
    max_tokens: u32,
    subject_age: u8,
    chat: &Chat,
    messages: &[MessageRow],
) -> ClassifyRequest {
    let batch: Vec<_> = messages
        .iter()
        .map(|m| {
            json!({
                "message_id": m.id,
                "role": m.sender_role,
                "sent_at": m.created_at,
                "text": m.text_for_analysis(),
                "has_audio": m.modality == "audio" || m.modality == "video",
            })
        })
        .collect();

    let user_content = json!({
        "subject_age": subject_age,
        "platform": chat.platform,
        "is_group_chat": chat.is_group,
        "messages": batch,
    })
    .to_string();

    ClassifyRequest {
        model: model.to_string(),
        system_prompt: Some(SMALL_SYSTEM_PROMPT.to_string()),
        user_content,
        max_tokens,
    }
}

impl Pipeline {
    /// Run a Tier-1 pass over `messages` for one conversation.
    ///
    /// On escalation, invokes Tier-2 over the trailing conversation window
    /// before returning.
    pub async fn run_small(
        &self,
        chat: &Chat,
        messages: &[MessageRow],
    ) -> Result<SmallScanResult, VigilError> {
        if messages.is_empty() {
            return Ok(SmallScanResult::Skipped);
        }

        let Some(subject) = subjects::get_subject(&self.db, &chat.subject_id).await? else {
            warn!(subject_id = %chat.subject_id, "tier-1 skipped: unknown subject");
            return Ok(SmallScanResult::Skipped);
        };
        if !subject.monitoring_enabled {
            return Ok(SmallScanResult::Skipped);
        }

        let request = build_small_request(
            &self.tiers.small_model,
            self.tiers.small_max_tokens,
            self.subject_age(&subject),
            chat,
            messages,
        );
        let timeout = Duration::from_secs(self.policy.call_timeout_secs);

        let response = match call_classifier(&self.provider, request, timeout).await {
            CallOutcome::Completed(response) => response,
            CallOutcome::Retryable(reason) => {
                info!(chat_id = %chat.id, reason, "tier-1 scan deferred");
                return Ok(SmallScanResult::SoftFailure(reason));
            }
            CallOutcome::Fatal(err) => return Err(err),
        };

        if let Err(e) = self
            .budget
            .ledger()
            .record_usage(&chat.subject_id, Tier::Small, &response.usage, &response.model)
            .await
        {
            error!(subject_id = %chat.subject_id, error = %e, "failed to record tier-1 usage");
        }

        let verdict = match parse_small_verdict(&response.content) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(chat_id = %chat.id, error = %e, "tier-1 verdict unparseable, failing soft");
                return Ok(SmallScanResult::SoftFailure(e.to_string()));
            }
        };

        let known_ids: HashSet<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        let now = now_iso();
        let mut signals_persisted = 0;
        for v in &verdict.messages {
            if !known_ids.contains(v.message_id.as_str()) {
                warn!(message_id = %v.message_id, "tier-1 returned unknown message id");
                continue;
            }
            let signal = SmallSignal {
                message_id: v.message_id.clone(),
                chat_id: chat.id.clone(),
                risk_score: v.risk_score,
                risk_codes: v.risk_codes.clone(),
                escalate: v.escalate,
                created_at: now.clone(),
            };
            // A failed insert must not block the escalation decision already
            // computed in memory; it is logged for reconciliation.
            match signals::upsert_signal(&self.db, &signal).await {
                Ok(()) => signals_persisted += 1,
                Err(e) => {
                    error!(message_id = %v.message_id, error = %e, "failed to persist small signal")
                }
            }
        }

        checkpoints::complete_small_scan(&self.db, &chat.id, &now).await?;

        let escalated = should_escalate(&verdict, self.policy.escalation_score);
        if escalated {
            let window_to = chrono::Utc::now();
            let window_from = window_to - chrono::Duration::minutes(self.window_mins as i64);
            if let Err(e) = self.run_smart(chat, window_from, window_to).await {
                error!(chat_id = %chat.id, error = %e, "tier-2 escalation failed");
            }
        }

        info!(
            chat_id = %chat.id,
            signals = signals_persisted,
            escalated,
            "tier-1 scan complete"
        );
        Ok(SmallScanResult::Completed {
            signals_persisted,
            escalated,
        })
    }
}
