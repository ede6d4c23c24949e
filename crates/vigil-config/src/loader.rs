// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vigil.toml` > `~/.config/vigil/vigil.toml` >
//! `/etc/vigil/vigil.toml` with environment variable overrides via the
//! `VIGIL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VigilConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vigil/vigil.toml` (system-wide)
/// 3. `~/.config/vigil/vigil.toml` (user XDG config)
/// 4. `./vigil.toml` (local directory)
/// 5. `VIGIL_*` environment variables
pub fn load_config() -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::file("/etc/vigil/vigil.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vigil/vigil.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vigil.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `VIGIL_BUDGET_SOFT_LIMIT_USD` must map to
/// `budget.soft_limit_usd`, not `budget.soft.limit.usd`.
fn env_provider() -> Env {
    Env::prefixed("VIGIL_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("tiers_", "tiers.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("budget_", "budget.", 1)
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("scheduler_", "scheduler.", 1)
            .replacen("notify_", "notify.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
