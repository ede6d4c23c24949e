// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Vigil escalation pipeline.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use vigil_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Service name: {}", config.agent.name);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::VigilConfig;

use thiserror::Error;

/// A configuration error: either a load/parse failure or a semantic violation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment failed to load or deserialize the configuration.
    #[error("config load error: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A semantic constraint was violated after deserialization.
    #[error("invalid config: {message}")]
    Validation { message: String },
}

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `VigilConfig` or the list of all collected errors.
pub fn load_and_validate() -> Result<VigilConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Load(Box::new(err))]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<VigilConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Load(Box::new(err))]),
    }
}

/// Print config errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        eprintln!("vigil: {err}");
    }
}
