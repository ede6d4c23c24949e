// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Vigil escalation pipeline.
//!
//! Pre-filter -> Tier-1 batch classification -> Tier-2 contextual decision
//! (with budget-gated Tier-3 fallback) -> finding emission. Every handler
//! runs to completion or fails; all cross-invocation state lives in the
//! shared store, and the scan checkpoint upsert is the serialization point
//! for racing triggers.

pub mod emitter;
pub mod ingest;
pub mod invoke;
pub mod prefilter;
pub mod small;
pub mod smart;
pub mod trigger;

use std::sync::Arc;

use chrono::Datelike;
use vigil_config::VigilConfig;
use vigil_config::model::{PipelineConfig, TierConfig};
use vigil_core::{ClassifierProvider, MediaUnderstanding, Notifier, VigilError};
use vigil_cost::BudgetGate;
use vigil_storage::Database;
use vigil_storage::models::Subject;

pub use invoke::{CallOutcome, call_classifier};
pub use prefilter::{Prefilter, PrefilterHit, RoutePriority};

/// The assembled pipeline: storage, adapters, budget gate, and thresholds.
///
/// Cheap to share behind an `Arc`; all methods take `&self` and hold no
/// in-process state across invocations.
pub struct Pipeline {
    db: Database,
    provider: Arc<dyn ClassifierProvider>,
    notifier: Arc<dyn Notifier>,
    media: Arc<dyn MediaUnderstanding>,
    budget: BudgetGate,
    prefilter: Prefilter,
    tiers: TierConfig,
    policy: PipelineConfig,
    /// Size of the Tier-2 conversation window, in minutes.
    window_mins: u32,
}

impl Pipeline {
    /// Assemble a pipeline from configuration and adapters.
    pub fn new(
        db: Database,
        provider: Arc<dyn ClassifierProvider>,
        notifier: Arc<dyn Notifier>,
        media: Arc<dyn MediaUnderstanding>,
        budget: BudgetGate,
        config: &VigilConfig,
    ) -> Result<Self, VigilError> {
        Ok(Self {
            db,
            provider,
            notifier,
            media,
            budget,
            prefilter: Prefilter::new()?,
            tiers: config.tiers.clone(),
            policy: config.pipeline.clone(),
            window_mins: config.scheduler.window_mins,
        })
    }

    /// The shared database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The budget gate (shared with the scheduler's throttling decision).
    pub fn budget(&self) -> &BudgetGate {
        &self.budget
    }

    /// Subject age from birth year, with the configured default when unknown.
    pub fn subject_age(&self, subject: &Subject) -> u8 {
        match subject.birth_year {
            Some(year) => {
                let current = chrono::Utc::now().year();
                (current - year).clamp(0, 120) as u8
            }
            None => self.policy.default_subject_age,
        }
    }
}
