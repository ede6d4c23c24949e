// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vigil escalation pipeline.
//!
//! A single taxonomy distinguishes retryable failures (rate limits, transient
//! provider outages, timeouts) from fatal ones. Callers never retry in-call;
//! a retryable failure is surfaced soft and the next scheduler tick or message
//! trigger retries naturally.

use thiserror::Error;

/// The primary error type used across all Vigil crates.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-transient classifier provider errors (4xx, auth, malformed request).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider rate limit or quota exhaustion (HTTP 429). Retryable later.
    #[error("provider rate limited: {message}")]
    RateLimited { message: String },

    /// Transient provider outage (5xx, overloaded). Retryable later.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// A classifier call exceeded its per-call timeout. Retryable later.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Classifier returned JSON that does not match the expected schema.
    #[error("classifier output parse error: {message}")]
    Parse { message: String },

    /// Guardian notification delivery failed (best-effort, never fatal upstream).
    #[error("notification error: {message}")]
    Notification {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VigilError {
    /// Whether the failure is worth retrying on a later tick.
    ///
    /// Rate limits, transient outages, and timeouts resolve on their own;
    /// everything else will fail the same way if replayed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VigilError::RateLimited { .. }
                | VigilError::Unavailable { .. }
                | VigilError::Timeout { .. }
        )
    }
}
