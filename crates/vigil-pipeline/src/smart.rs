// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier-2 contextual decision-maker ("smart agent") with Tier-3 fallback.
//!
//! Evaluates a whole conversation window plus the accumulated Tier-1 signals
//! and produces a single decision: ignore, monitor, or alert. On low
//! confidence (and only when the budget gate allows), the same reasoning is
//! re-run on the stronger fallback model and the fallback decision replaces
//! the original; any fallback failure keeps the original decision rather
//! than blocking. The decision is persisted regardless of action.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use vigil_core::types::ClassifyRequest;
use vigil_core::{Action, ThreatType, Tier, VigilError};
use vigil_storage::models::{Chat, MessageRow, SmallSignal, SmartDecisionRow, fmt_iso, now_iso};
use vigil_storage::queries::{checkpoints, decisions, messages, signals, subjects};

use crate::Pipeline;
use crate::invoke::{CallOutcome, call_classifier, extract_json};

/// System instruction for the Tier-2 agent.
const SMART_SYSTEM_PROMPT: &str = "\
You are a senior safety analyst reviewing a window of a minor's chat \
conversation, together with per-message signals from a first-pass \
classifier. Reason over PATTERNS across the whole window, not isolated \
messages: escalating intimacy over time, requests to move platforms, \
pressure after refusal, age-gap probing, gradual desensitization, threats \
referencing earlier messages.\n\
threat_type must be one of: grooming, sexual_content, violence, extortion, \
manipulation, none.\n\
action must be one of: ignore, monitor, alert. Use \"alert\" only when a \
guardian should be told now; \"monitor\" when the pattern is concerning but \
inconclusive; \"ignore\" when the window is benign.\n\
Respond with ONLY a JSON object, no prose:\n\
{\"final_risk_score\": 0, \"threat_type\": \"none\", \"confidence\": 0.0, \
\"action\": \"ignore\", \"key_reasons\": [], \"evidence_message_ids\": []}";

/// Extra instruction for the Tier-3 fallback pass.
const FALLBACK_INSTRUCTION: &str = "\
\nThis is a second, thorough review: the first pass returned low confidence. \
Weigh every message and signal carefully and commit to a decisive answer.";

/// Typed Tier-2 verdict.
#[derive(Debug, Clone)]
pub struct SmartVerdict {
    pub final_risk_score: u8,
    pub threat_type: ThreatType,
    /// Confidence, clamped to 0.0-1.0.
    pub confidence: f64,
    pub action: Action,
    pub key_reasons: Vec<String>,
    pub evidence_message_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSmartVerdict {
    final_risk_score: f64,
    threat_type: String,
    confidence: f64,
    action: String,
    #[serde(default)]
    key_reasons: Vec<String>,
    #[serde(default)]
    evidence_message_ids: Vec<String>,
}

/// Parse a strict Tier-2 JSON verdict.
///
/// The threat-type and action vocabularies are closed: anything outside them
/// is a parse error, never a partially-typed decision.
pub fn parse_smart_verdict(content: &str) -> Result<SmartVerdict, VigilError> {
    let raw: RawSmartVerdict =
        serde_json::from_str(extract_json(content)).map_err(|e| VigilError::Parse {
            message: format!("tier-2 verdict: {e}"),
        })?;

    let threat_type = ThreatType::from_str(&raw.threat_type).map_err(|_| VigilError::Parse {
        message: format!("tier-2 verdict: unknown threat_type `{}`", raw.threat_type),
    })?;
    let action = Action::from_str(&raw.action).map_err(|_| VigilError::Parse {
        message: format!("tier-2 verdict: unknown action `{}`", raw.action),
    })?;

    Ok(SmartVerdict {
        final_risk_score: raw.final_risk_score.clamp(0.0, 100.0) as u8,
        threat_type,
        confidence: raw.confidence.clamp(0.0, 1.0),
        action,
        key_reasons: raw.key_reasons,
        evidence_message_ids: raw.evidence_message_ids,
    })
}

/// Result of a Tier-2 invocation.
#[derive(Debug)]
pub enum SmartScanResult {
    /// Nothing to evaluate (empty window, unknown subject, monitoring disabled).
    Skipped,
    /// The call or its parse failed soft; the heartbeat retries next tick.
    SoftFailure(String),
    /// A decision was persisted.
    Decided(SmartDecisionRow),
}

#[allow(clippy::too_many_arguments)]
fn build_smart_request(
    model: &str,
    max_tokens: u32,
    thorough: bool,
    subject_age: u8,
    chat: &Chat,
    window_from: &str,
    window_to: &str,
    window: &[MessageRow],
    tier1_signals: &[SmallSignal],
) -> ClassifyRequest {
    let message_batch: Vec<_> = window
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

    let signal_batch: Vec<_> = tier1_signals
        .iter()
        .map(|s| {
            json!({
                "message_id": s.message_id,
                "risk_score": s.risk_score,
                "risk_codes": s.risk_codes,
                "escalate": s.escalate,
            })
        })
        .collect();

    let user_content = json!({
        "subject_age": subject_age,
        "platform": chat.platform,
        "is_group_chat": chat.is_group,
        "window": {"from": window_from, "to": window_to},
        "messages": message_batch,
        "tier1_signals": signal_batch,
    })
    .to_string();

    let mut system_prompt = SMART_SYSTEM_PROMPT.to_string();
    if thorough {
        system_prompt.push_str(FALLBACK_INSTRUCTION);
    }

    ClassifyRequest {
        model: model.to_string(),
        system_prompt: Some(system_prompt),
        user_content,
        max_tokens,
    }
}

impl Pipeline {
    /// Run a Tier-2 evaluation over the conversation window `[from, to]`.
    pub async fn run_smart(
        &self,
        chat: &Chat,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SmartScanResult, VigilError> {
        let window_from = fmt_iso(&from);
        let window_to = fmt_iso(&to);

        let window = messages::get_window(&self.db, &chat.id, &window_from, &window_to).await?;
        if window.is_empty() {
            return Ok(SmartScanResult::Skipped);
        }

        let Some(subject) = subjects::get_subject(&self.db, &chat.subject_id).await? else {
            warn!(subject_id = %chat.subject_id, "tier-2 skipped: unknown subject");
            return Ok(SmartScanResult::Skipped);
        };
        if !subject.monitoring_enabled {
            return Ok(SmartScanResult::Skipped);
        }

        let window_ids: Vec<String> = window.iter().map(|m| m.id.clone()).collect();
        let tier1_signals = signals::get_signals_for_messages(&self.db, &window_ids).await?;

        let subject_age = self.subject_age(&subject);
        let timeout = Duration::from_secs(self.policy.call_timeout_secs);
        let request = build_smart_request(
            &self.tiers.smart_model,
            self.tiers.smart_max_tokens,
            false,
            subject_age,
            chat,
            &window_from,
            &window_to,
            &window,
            &tier1_signals,
        );

        let response = match call_classifier(&self.provider, request, timeout).await {
            CallOutcome::Completed(response) => response,
            CallOutcome::Retryable(reason) => {
                info!(chat_id = %chat.id, reason, "tier-2 scan deferred");
                return Ok(SmartScanResult::SoftFailure(reason));
            }
            CallOutcome::Fatal(err) => return Err(err),
        };

        if let Err(e) = self
            .budget
            .ledger()
            .record_usage(&chat.subject_id, Tier::Smart, &response.usage, &response.model)
            .await
        {
            warn!(subject_id = %chat.subject_id, error = %e, "failed to record tier-2 usage");
        }

        let mut verdict = match parse_smart_verdict(&response.content) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(chat_id = %chat.id, error = %e, "tier-2 verdict unparseable, failing soft");
                return Ok(SmartScanResult::SoftFailure(e.to_string()));
            }
        };

        // Fallback rule: low confidence on a non-ignore decision, budget
        // permitting. A skipped or failed fallback keeps the original
        // decision.
        let mut used_fallback = false;
        if verdict.confidence < self.policy.fallback_confidence && verdict.action != Action::Ignore
        {
            let status = self.budget.check_budget(&chat.subject_id).await?;
            if status.fallback_allowed {
                let fb_request = build_smart_request(
                    &self.tiers.fallback_model,
                    self.tiers.fallback_max_tokens,
                    true,
                    subject_age,
                    chat,
                    &window_from,
                    &window_to,
                    &window,
                    &tier1_signals,
                );
                match call_classifier(&self.provider, fb_request, timeout).await {
                    CallOutcome::Completed(fb_response) => {
                        if let Err(e) = self
                            .budget
                            .ledger()
                            .record_usage(
                                &chat.subject_id,
                                Tier::Fallback,
                                &fb_response.usage,
                                &fb_response.model,
                            )
                            .await
                        {
                            warn!(subject_id = %chat.subject_id, error = %e,
                                "failed to record fallback usage");
                        }
                        match parse_smart_verdict(&fb_response.content) {
                            Ok(fb_verdict) => {
                                verdict = fb_verdict;
                                used_fallback = true;
                            }
                            Err(e) => {
                                warn!(chat_id = %chat.id, error = %e,
                                    "fallback verdict unparseable, keeping original decision");
                            }
                        }
                    }
                    CallOutcome::Retryable(reason) => {
                        warn!(chat_id = %chat.id, reason,
                            "fallback call failed soft, keeping original decision");
                    }
                    CallOutcome::Fatal(err) => {
                        warn!(chat_id = %chat.id, error = %err,
                            "fallback call failed, keeping original decision");
                    }
                }
            } else {
                info!(
                    subject_id = %chat.subject_id,
                    confidence = verdict.confidence,
                    "tier-3 fallback skipped for budget reasons"
                );
            }
        }

        // Evidence must point at messages that exist in the window.
        let evidence: Vec<String> = verdict
            .evidence_message_ids
            .iter()
            .filter(|id| {
                let known = window_ids.iter().any(|w| w == *id);
                if !known {
                    warn!(message_id = %id, "tier-2 cited unknown evidence message id");
                }
                known
            })
            .cloned()
            .collect();

        let decision = SmartDecisionRow {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat.id.clone(),
            subject_id: chat.subject_id.clone(),
            window_from,
            window_to,
            final_risk_score: verdict.final_risk_score,
            threat_type: verdict.threat_type,
            confidence: verdict.confidence,
            action: verdict.action,
            key_reasons: verdict.key_reasons,
            evidence_message_ids: evidence,
            used_fallback,
            created_at: now_iso(),
        };

        decisions::insert_decision(&self.db, &decision).await?;
        checkpoints::stamp_smart_scan(&self.db, &chat.id, &decision.created_at).await?;

        info!(
            chat_id = %chat.id,
            action = %decision.action,
            score = decision.final_risk_score,
            confidence = decision.confidence,
            used_fallback,
            "tier-2 decision persisted"
        );

        if decision.action == Action::Alert {
            self.emit_finding(&decision).await?;
        }

        Ok(SmartScanResult::Decided(decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_verdict() {
        let content = r#"{
            "final_risk_score": 72,
            "threat_type": "grooming",
            "confidence": 0.82,
            "action": "alert",
            "key_reasons": ["age gap probing", "secrecy pressure"],
            "evidence_message_ids": ["m1", "m3"]
        }"#;
        let verdict = parse_smart_verdict(content).unwrap();
        assert_eq!(verdict.final_risk_score, 72);
        assert_eq!(verdict.threat_type, ThreatType::Grooming);
        assert_eq!(verdict.action, Action::Alert);
        assert_eq!(verdict.key_reasons.len(), 2);
    }

    #[test]
    fn parse_rejects_unknown_threat_type() {
        let content = r#"{"final_risk_score": 10, "threat_type": "cyberbullying",
            "confidence": 0.9, "action": "ignore"}"#;
        let err = parse_smart_verdict(content).unwrap_err();
        assert!(err.to_string().contains("cyberbullying"));
    }

    #[test]
    fn parse_rejects_unknown_action() {
        let content = r#"{"final_risk_score": 10, "threat_type": "none",
            "confidence": 0.9, "action": "escalate"}"#;
        assert!(parse_smart_verdict(content).is_err());
    }

    #[test]
    fn parse_clamps_score_and_confidence() {
        let content = r#"{"final_risk_score": 150, "threat_type": "extortion",
            "confidence": 1.7, "action": "alert"}"#;
        let verdict = parse_smart_verdict(content).unwrap();
        assert_eq!(verdict.final_risk_score, 100);
        assert!((verdict.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_accepts_fenced_output() {
        let content = "```json\n{\"final_risk_score\": 5, \"threat_type\": \"none\", \
            \"confidence\": 0.95, \"action\": \"ignore\"}\n```";
        let verdict = parse_smart_verdict(content).unwrap();
        assert_eq!(verdict.action, Action::Ignore);
    }
}
