// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all violations instead of failing fast.

use crate::ConfigError;
use crate::model::VigilConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &VigilConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.budget.soft_limit_usd < 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget.soft_limit_usd must be non-negative, got {}",
                config.budget.soft_limit_usd
            ),
        });
    }

    if config.budget.hard_limit_usd < config.budget.soft_limit_usd {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget.hard_limit_usd ({}) must be at least budget.soft_limit_usd ({})",
                config.budget.hard_limit_usd, config.budget.soft_limit_usd
            ),
        });
    }

    if config.pipeline.escalation_score > 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.escalation_score must be 0-100, got {}",
                config.pipeline.escalation_score
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.pipeline.fallback_confidence) {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.fallback_confidence must be within 0.0-1.0, got {}",
                config.pipeline.fallback_confidence
            ),
        });
    }

    if config.pipeline.call_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.call_timeout_secs must be positive".to_string(),
        });
    }

    for (name, hour) in [
        ("scheduler.active_hours_start", config.scheduler.active_hours_start),
        ("scheduler.active_hours_end", config.scheduler.active_hours_end),
    ] {
        if hour > 23 {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be 0-23, got {hour}"),
            });
        }
    }

    for (name, mins) in [
        ("scheduler.tight_interval_mins", config.scheduler.tight_interval_mins),
        ("scheduler.normal_interval_mins", config.scheduler.normal_interval_mins),
        ("scheduler.wide_interval_mins", config.scheduler.wide_interval_mins),
        ("scheduler.heartbeat_interval_mins", config.scheduler.heartbeat_interval_mins),
        ("scheduler.window_mins", config.scheduler.window_mins),
    ] {
        if mins == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be positive"),
            });
        }
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
