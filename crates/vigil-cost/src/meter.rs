// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-subject monthly usage meter.
//!
//! One row per (subject, month), created lazily on the first chargeable call.
//! Every increment is a single `INSERT .. ON CONFLICT DO UPDATE .. + excluded`
//! statement, so concurrent tier calls for the same subject never lose
//! updates -- the increments are associative and commutative at the datastore.

use rusqlite::params;
use tracing::info;
use vigil_core::{Tier, TokenUsage, VigilError};
use vigil_storage::database::{Database, map_tr_err};
use vigil_storage::models::{UsageMeterRow, current_month_key, now_iso};

use crate::pricing;

/// Persistent usage meter backed by the shared SQLite database.
#[derive(Clone)]
pub struct UsageLedger {
    db: Database,
}

impl UsageLedger {
    /// Create a usage ledger over the shared database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record one chargeable call: computes cost from the model pricing table
    /// and atomically increments the subject's current-month row.
    ///
    /// Returns the incremental cost in USD.
    pub async fn record_usage(
        &self,
        subject_id: &str,
        tier: Tier,
        usage: &TokenUsage,
        model: &str,
    ) -> Result<f64, VigilError> {
        let cost = pricing::calculate_cost(usage, &pricing::get_pricing(model));
        let month = current_month_key();
        self.record_cost(subject_id, &month, tier, cost).await?;

        info!(
            subject_id,
            tier = %tier,
            model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost_usd = cost,
            "usage recorded"
        );
        Ok(cost)
    }

    /// Atomically add a cost and one call of the given tier to a month row.
    pub async fn record_cost(
        &self,
        subject_id: &str,
        month: &str,
        tier: Tier,
        cost_usd: f64,
    ) -> Result<(), VigilError> {
        let subject_id = subject_id.to_string();
        let month = month.to_string();
        let now = now_iso();
        let (small, smart, fallback, caption): (i64, i64, i64, i64) = match tier {
            Tier::Small => (1, 0, 0, 0),
            Tier::Smart => (0, 1, 0, 0),
            Tier::Fallback => (0, 0, 1, 0),
            Tier::Caption => (0, 0, 0, 1),
        };

        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO usage_meter
                         (subject_id, month, estimated_cost_usd, small_calls, smart_calls,
                          fallback_calls, caption_calls, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(subject_id, month) DO UPDATE SET
                         estimated_cost_usd = usage_meter.estimated_cost_usd + excluded.estimated_cost_usd,
                         small_calls = usage_meter.small_calls + excluded.small_calls,
                         smart_calls = usage_meter.smart_calls + excluded.smart_calls,
                         fallback_calls = usage_meter.fallback_calls + excluded.fallback_calls,
                         caption_calls = usage_meter.caption_calls + excluded.caption_calls,
                         updated_at = excluded.updated_at",
                    params![subject_id, month, cost_usd, small, smart, fallback, caption, now],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Read a subject's meter row for a month. Returns a zeroed row if no
    /// chargeable call has happened yet.
    pub async fn get_meter(
        &self,
        subject_id: &str,
        month: &str,
    ) -> Result<UsageMeterRow, VigilError> {
        let subject = subject_id.to_string();
        let month_key = month.to_string();
        let row = self
            .db
            .connection()
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT subject_id, month, estimated_cost_usd, small_calls, smart_calls,
                            fallback_calls, caption_calls
                     FROM usage_meter WHERE subject_id = ?1 AND month = ?2",
                    params![subject, month_key],
                    |row| {
                        Ok(UsageMeterRow {
                            subject_id: row.get(0)?,
                            month: row.get(1)?,
                            estimated_cost_usd: row.get(2)?,
                            small_calls: row.get::<_, i64>(3)? as u32,
                            smart_calls: row.get::<_, i64>(4)? as u32,
                            fallback_calls: row.get::<_, i64>(5)? as u32,
                            caption_calls: row.get::<_, i64>(6)? as u32,
                        })
                    },
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        Ok(row.unwrap_or_else(|| UsageMeterRow {
            subject_id: subject_id.to_string(),
            month: month.to_string(),
            ..UsageMeterRow::default()
        }))
    }

    /// Read a subject's meter row for the current month.
    pub async fn current_meter(&self, subject_id: &str) -> Result<UsageMeterRow, VigilError> {
        self.get_meter(subject_id, &current_month_key()).await
    }
}
