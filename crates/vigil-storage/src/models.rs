// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for pipeline storage entities.
//!
//! List-valued columns (risk codes, key reasons, evidence ids, pending batch)
//! are stored as JSON text and round-tripped through serde_json in the query
//! layer. Timestamps are ISO 8601 UTC text.

use serde::{Deserialize, Serialize};
use vigil_core::{Action, RiskCode, RiskLevel, ThreatType};

/// Format the current UTC time as an ISO 8601 text timestamp.
pub fn now_iso() -> String {
    fmt_iso(&chrono::Utc::now())
}

/// Format a UTC time as an ISO 8601 text timestamp.
pub fn fmt_iso(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse an ISO 8601 text timestamp back into a UTC time.
pub fn parse_iso(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

/// Month key for the usage meter, e.g. "2026-03".
pub fn current_month_key() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

/// A monitored subject (the minor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    /// Birth year for age inference; `None` falls back to the configured default age.
    pub birth_year: Option<i32>,
    pub monitoring_enabled: bool,
}

/// A conversation thread scoped to one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub subject_id: String,
    pub label: String,
    pub is_group: bool,
    pub platform: String,
    pub last_activity_at: Option<String>,
}

/// One inbound/outbound unit of communication.
///
/// Immutable once stored except for caption/transcript backfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub subject_id: String,
    pub sender_role: String,
    pub modality: String,
    pub body: Option<String>,
    pub caption: Option<String>,
    pub media_ref: Option<String>,
    pub created_at: String,
}

impl MessageRow {
    /// Body text with caption fallback, for classifier prompts.
    pub fn text_for_analysis(&self) -> &str {
        match (&self.body, &self.caption) {
            (Some(body), _) if !body.is_empty() => body.as_str(),
            (_, Some(caption)) => caption.as_str(),
            (Some(body), None) => body.as_str(),
            (None, None) => "",
        }
    }
}

/// Per-conversation scheduling state; exactly one row per chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCheckpoint {
    pub chat_id: String,
    pub last_small_scan_at: Option<String>,
    pub last_smart_scan_at: Option<String>,
    pub last_activity_at: Option<String>,
    pub scan_interval_mins: u32,
    /// Message ids awaiting the next batch Tier-1 pass.
    pub pending_batch: Vec<String>,
    pub updated_at: String,
}

/// Tier-1 output for a single message. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmallSignal {
    pub message_id: String,
    pub chat_id: String,
    /// Risk score, 0-100.
    pub risk_score: u8,
    pub risk_codes: Vec<RiskCode>,
    pub escalate: bool,
    pub created_at: String,
}

/// Tier-2 output for one conversation-window evaluation. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartDecisionRow {
    pub id: String,
    pub chat_id: String,
    pub subject_id: String,
    pub window_from: String,
    pub window_to: String,
    /// Final risk score, 0-100.
    pub final_risk_score: u8,
    pub threat_type: ThreatType,
    /// Confidence, 0.0-1.0.
    pub confidence: f64,
    pub action: Action,
    pub key_reasons: Vec<String>,
    pub evidence_message_ids: Vec<String>,
    /// Whether the persisted decision came from the Tier-3 fallback model.
    pub used_fallback: bool,
    pub created_at: String,
}

/// A persisted, guardian-visible alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingRow {
    pub id: String,
    pub subject_id: String,
    pub decision_id: String,
    pub threat_detected: bool,
    pub risk_level: RiskLevel,
    pub threat_types: Vec<ThreatType>,
    pub explanation: String,
    pub handled: bool,
    pub handled_at: Option<String>,
    pub created_at: String,
}

/// One month of usage for one subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMeterRow {
    pub subject_id: String,
    pub month: String,
    pub estimated_cost_usd: f64,
    pub small_calls: u32,
    pub smart_calls: u32,
    pub fallback_calls: u32,
    pub caption_calls: u32,
}
