// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vigil escalation pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Every numeric threshold the pipeline applies lives
//! here with its production default.

use serde::{Deserialize, Serialize};

/// Top-level Vigil configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Model selection per pipeline tier.
    #[serde(default)]
    pub tiers: TierConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-subject monthly budget limits.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Pipeline thresholds and call policy.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Adaptive scheduler cadence settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Guardian notification delivery settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Inbound HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "vigil".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// Model selection and output budget per pipeline tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Model identifier for Tier-1 batch classification (Haiku tier).
    #[serde(default = "default_small_model")]
    pub small_model: String,

    /// Model identifier for Tier-2 contextual decisions (Sonnet tier).
    #[serde(default = "default_smart_model")]
    pub smart_model: String,

    /// Model identifier for Tier-3 fallback re-evaluation (Opus tier).
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Max tokens for Tier-1 responses.
    #[serde(default = "default_small_max_tokens")]
    pub small_max_tokens: u32,

    /// Max tokens for Tier-2 responses.
    #[serde(default = "default_smart_max_tokens")]
    pub smart_max_tokens: u32,

    /// Max tokens for Tier-3 fallback responses.
    #[serde(default = "default_fallback_max_tokens")]
    pub fallback_max_tokens: u32,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            small_model: default_small_model(),
            smart_model: default_smart_model(),
            fallback_model: default_fallback_model(),
            small_max_tokens: default_small_max_tokens(),
            smart_max_tokens: default_smart_max_tokens(),
            fallback_max_tokens: default_fallback_max_tokens(),
        }
    }
}

fn default_small_model() -> String {
    "claude-haiku-4-5-20250901".to_string()
}

fn default_smart_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_fallback_model() -> String {
    "claude-opus-4-20250514".to_string()
}

fn default_small_max_tokens() -> u32 {
    1024
}

fn default_smart_max_tokens() -> u32 {
    2048
}

fn default_fallback_max_tokens() -> u32 {
    2048
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vigil").join("vigil.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("vigil.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Per-subject monthly budget limits.
///
/// The soft limit disables Tier-3 fallback and widens scan cadence; the hard
/// limit is logged at error severity while cheap-tier scanning continues.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Soft monthly spend limit per subject in USD.
    #[serde(default = "default_soft_limit_usd")]
    pub soft_limit_usd: f64,

    /// Hard monthly spend limit per subject in USD.
    #[serde(default = "default_hard_limit_usd")]
    pub hard_limit_usd: f64,

    /// Maximum fallback calls per subject per month, enforced independently
    /// of cost.
    #[serde(default = "default_max_fallback_calls")]
    pub max_fallback_calls: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            soft_limit_usd: default_soft_limit_usd(),
            hard_limit_usd: default_hard_limit_usd(),
            max_fallback_calls: default_max_fallback_calls(),
        }
    }
}

fn default_soft_limit_usd() -> f64 {
    4.50
}

fn default_hard_limit_usd() -> f64 {
    5.00
}

fn default_max_fallback_calls() -> u32 {
    30
}

/// Pipeline thresholds and classifier call policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Tier-1 risk score at or above which a conversation escalates to Tier-2.
    #[serde(default = "default_escalation_score")]
    pub escalation_score: u8,

    /// Tier-2 confidence below which the fallback model is consulted
    /// (when the action is not `ignore` and budget allows).
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Per-call timeout for classifier invocations, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Subject age assumed when no birth year is on record.
    #[serde(default = "default_subject_age")]
    pub default_subject_age: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            escalation_score: default_escalation_score(),
            fallback_confidence: default_fallback_confidence(),
            call_timeout_secs: default_call_timeout_secs(),
            default_subject_age: default_subject_age(),
        }
    }
}

fn default_escalation_score() -> u8 {
    40
}

fn default_fallback_confidence() -> f64 {
    0.55
}

fn default_call_timeout_secs() -> u64 {
    45
}

fn default_subject_age() -> u8 {
    13
}

/// Adaptive scheduler cadence configuration.
///
/// Intervals are minutes between Tier-1 passes per conversation. The
/// heartbeat interval bounds how stale a Tier-2 view of an active
/// conversation may get regardless of Tier-1 triggers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between scheduler ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Start of active hours (local hour, 0-23, inclusive).
    #[serde(default = "default_active_hours_start")]
    pub active_hours_start: u8,

    /// End of active hours (local hour, 0-23, exclusive).
    #[serde(default = "default_active_hours_end")]
    pub active_hours_end: u8,

    /// Tier-1 interval during active hours with recent activity, in minutes.
    #[serde(default = "default_tight_interval_mins")]
    pub tight_interval_mins: u32,

    /// Tier-1 interval outside active hours, in minutes.
    #[serde(default = "default_normal_interval_mins")]
    pub normal_interval_mins: u32,

    /// Tier-1 interval when throttled (inactive or over budget), in minutes.
    #[serde(default = "default_wide_interval_mins")]
    pub wide_interval_mins: u32,

    /// Minutes without activity after which a conversation is throttled.
    #[serde(default = "default_inactivity_threshold_mins")]
    pub inactivity_threshold_mins: u32,

    /// Minutes between Tier-2 heartbeat passes per conversation.
    #[serde(default = "default_heartbeat_interval_mins")]
    pub heartbeat_interval_mins: u32,

    /// A heartbeat only runs if there was activity within this many minutes.
    #[serde(default = "default_heartbeat_lookback_mins")]
    pub heartbeat_lookback_mins: u32,

    /// Size of the conversation window handed to Tier-2, in minutes.
    #[serde(default = "default_window_mins")]
    pub window_mins: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            active_hours_start: default_active_hours_start(),
            active_hours_end: default_active_hours_end(),
            tight_interval_mins: default_tight_interval_mins(),
            normal_interval_mins: default_normal_interval_mins(),
            wide_interval_mins: default_wide_interval_mins(),
            inactivity_threshold_mins: default_inactivity_threshold_mins(),
            heartbeat_interval_mins: default_heartbeat_interval_mins(),
            heartbeat_lookback_mins: default_heartbeat_lookback_mins(),
            window_mins: default_window_mins(),
        }
    }
}

fn default_tick_interval_secs() -> u64 {
    180
}

fn default_active_hours_start() -> u8 {
    8
}

fn default_active_hours_end() -> u8 {
    22
}

fn default_tight_interval_mins() -> u32 {
    5
}

fn default_normal_interval_mins() -> u32 {
    15
}

fn default_wide_interval_mins() -> u32 {
    60
}

fn default_inactivity_threshold_mins() -> u32 {
    30
}

fn default_heartbeat_interval_mins() -> u32 {
    60
}

fn default_heartbeat_lookback_mins() -> u32 {
    120
}

fn default_window_mins() -> u32 {
    60
}

/// Guardian notification delivery configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Webhook URL for guardian notices. `None` logs notices instead.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Bearer token attached to webhook deliveries.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Inbound HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on /v1 routes. `None` disables auth.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8320
}
