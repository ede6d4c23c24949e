// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types used across the Vigil pipeline.
//!
//! The wire vocabularies (risk codes, threat types, actions) are fixed: the
//! classifier prompts enumerate them and the parsers reject anything outside
//! them. Keep the serde names in sync with the prompt text in vigil-pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a monitored subject (the minor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

/// Unique identifier for a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Who sent a message within a monitored conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The monitored minor.
    Subject,
    /// Anyone else in the conversation.
    Contact,
}

/// Modality of an inbound message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

/// Risk code vocabulary shared by the pre-filter and the Tier-1 classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskCode {
    /// Grooming language (trust-building, age gap probing, gift offers).
    Grooming,
    /// Secrecy pressure ("don't tell anyone", "delete this").
    Secrecy,
    /// In-person meetup or location solicitation.
    Meetup,
    /// Sexualized conversation content.
    SexualContent,
    /// Requests for explicit imagery.
    ExplicitImagery,
    /// Threats, blackmail, sextortion.
    Extortion,
    /// Isolation tactics (driving wedges between the subject and others).
    Isolation,
    /// Phone numbers, addresses, or off-platform handle exchange.
    PersonalInfo,
}

impl RiskCode {
    /// Codes that force escalation to Tier-2 regardless of score.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            RiskCode::Meetup
                | RiskCode::Extortion
                | RiskCode::ExplicitImagery
                | RiskCode::Isolation
                | RiskCode::Grooming
        )
    }
}

/// Threat classification produced by the Tier-2 agent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    Grooming,
    SexualContent,
    Violence,
    Extortion,
    Manipulation,
    None,
}

/// Final action decided by the Tier-2 agent for a conversation window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Ignore,
    Monitor,
    Alert,
}

/// Guardian-facing severity of a finding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Derive a guardian-facing level from a 0-100 final risk score.
    ///
    /// `Critical` is reserved for externally-escalated findings and is never
    /// produced by score mapping.
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            RiskLevel::High
        } else if score >= 40 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Which pipeline tier a chargeable call belongs to.
///
/// Keys the per-tier call counters on the usage meter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Cheap first-pass batch classifier.
    Small,
    /// Mid-cost contextual decision-maker.
    Smart,
    /// Costly re-evaluation on low Tier-2 confidence.
    Fallback,
    /// Media caption / transcript calls.
    Caption,
}

/// Token counts for a single classifier call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

/// A request to a classifier provider.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    /// Model identifier for this call.
    pub model: String,
    /// System instruction constraining the classifier.
    pub system_prompt: Option<String>,
    /// The user-turn content (message batch or conversation window).
    pub user_content: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// A response from a classifier provider.
#[derive(Debug, Clone)]
pub struct ClassifyResponse {
    /// Provider-assigned response id.
    pub id: String,
    /// Raw text content returned by the model.
    pub content: String,
    /// Model that produced the response.
    pub model: String,
    /// Reason generation stopped, if reported.
    pub stop_reason: Option<String>,
    /// Token usage for cost accounting.
    pub usage: TokenUsage,
}

/// Payload delivered to the guardian notification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianNotice {
    /// Subject the finding concerns.
    pub subject_id: SubjectId,
    /// Persisted finding this notice was derived from.
    pub finding_id: String,
    /// Guardian-facing severity.
    pub risk_level: RiskLevel,
    /// Detected threat types.
    pub threat_types: Vec<ThreatType>,
    /// Free-text explanation (joined key reasons).
    pub explanation: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Notifier,
    Media,
}
