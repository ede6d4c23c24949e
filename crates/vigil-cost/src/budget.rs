// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget gating over the usage meter.
//!
//! Soft-limit breach disables Tier-3 fallback and tells the scheduler to
//! widen scan intervals. Hard-limit breach is logged at error severity while
//! cheap-tier scanning continues: monitoring never stops because of a
//! billing spike.

use tracing::{error, warn};
use vigil_config::model::BudgetConfig;
use vigil_core::VigilError;

use crate::meter::UsageLedger;

/// Result of a budget check for one subject, this month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStatus {
    /// Monthly spend is at or above the soft limit.
    pub soft_limit_exceeded: bool,
    /// Monthly spend is at or above the hard limit.
    pub hard_limit_exceeded: bool,
    /// Tier-3 fallback may still be invoked for this subject this month.
    pub fallback_allowed: bool,
}

impl BudgetStatus {
    /// Status for a subject with no recorded usage.
    pub fn unconstrained() -> Self {
        Self {
            soft_limit_exceeded: false,
            hard_limit_exceeded: false,
            fallback_allowed: true,
        }
    }
}

/// Budget gate combining the usage ledger with configured limits.
#[derive(Clone)]
pub struct BudgetGate {
    ledger: UsageLedger,
    config: BudgetConfig,
}

impl BudgetGate {
    /// Create a budget gate over a usage ledger.
    pub fn new(ledger: UsageLedger, config: BudgetConfig) -> Self {
        Self { ledger, config }
    }

    /// The underlying usage ledger.
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Check a subject's budget state for the current month.
    ///
    /// `fallback_allowed` is true only while the fallback-call count is below
    /// its cap AND cost is below the hard limit. Neither limit ever gates
    /// Tier-1/Tier-2 calls.
    pub async fn check_budget(&self, subject_id: &str) -> Result<BudgetStatus, VigilError> {
        let meter = self.ledger.current_meter(subject_id).await?;

        let soft_limit_exceeded = meter.estimated_cost_usd >= self.config.soft_limit_usd;
        let hard_limit_exceeded = meter.estimated_cost_usd >= self.config.hard_limit_usd;
        let fallback_allowed =
            meter.fallback_calls < self.config.max_fallback_calls && !hard_limit_exceeded;

        if hard_limit_exceeded {
            error!(
                subject_id,
                cost_usd = meter.estimated_cost_usd,
                hard_limit_usd = self.config.hard_limit_usd,
                "hard budget limit exceeded; cheap-tier scanning continues"
            );
        } else if soft_limit_exceeded {
            warn!(
                subject_id,
                cost_usd = meter.estimated_cost_usd,
                soft_limit_usd = self.config.soft_limit_usd,
                "soft budget limit exceeded; fallback disabled, scan cadence widened"
            );
        }

        Ok(BudgetStatus {
            soft_limit_exceeded,
            hard_limit_exceeded,
            fallback_allowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::Tier;
    use vigil_storage::Database;
    use vigil_storage::models::current_month_key;

    async fn gate() -> BudgetGate {
        let db = Database::open_in_memory().await.unwrap();
        BudgetGate::new(UsageLedger::new(db), BudgetConfig::default())
    }

    #[tokio::test]
    async fn fresh_subject_is_unconstrained() {
        let gate = gate().await;
        let status = gate.check_budget("subj-1").await.unwrap();
        assert_eq!(status, BudgetStatus::unconstrained());
    }

    #[tokio::test]
    async fn soft_limit_disables_fallback_only_via_hard() {
        let gate = gate().await;
        let month = current_month_key();

        // 4.60 is over the 4.50 soft limit but under the 5.00 hard limit.
        gate.ledger()
            .record_cost("subj-1", &month, Tier::Smart, 4.60)
            .await
            .unwrap();

        let status = gate.check_budget("subj-1").await.unwrap();
        assert!(status.soft_limit_exceeded);
        assert!(!status.hard_limit_exceeded);
        // Cost alone does not disable fallback until the hard limit.
        assert!(status.fallback_allowed);
    }

    #[tokio::test]
    async fn hard_limit_disables_fallback() {
        let gate = gate().await;
        let month = current_month_key();

        gate.ledger()
            .record_cost("subj-1", &month, Tier::Smart, 5.00)
            .await
            .unwrap();

        let status = gate.check_budget("subj-1").await.unwrap();
        assert!(status.soft_limit_exceeded);
        assert!(status.hard_limit_exceeded);
        assert!(!status.fallback_allowed);
    }

    #[tokio::test]
    async fn fallback_call_cap_is_independent_of_cost() {
        let gate = gate().await;
        let month = current_month_key();

        // 30 fallback calls at negligible cost reach the count cap.
        for _ in 0..30 {
            gate.ledger()
                .record_cost("subj-1", &month, Tier::Fallback, 0.001)
                .await
                .unwrap();
        }

        let status = gate.check_budget("subj-1").await.unwrap();
        assert!(!status.soft_limit_exceeded);
        assert!(!status.hard_limit_exceeded);
        assert!(!status.fallback_allowed, "count cap alone must disable fallback");
    }

    #[tokio::test]
    async fn one_below_cap_still_allowed() {
        let gate = gate().await;
        let month = current_month_key();

        for _ in 0..29 {
            gate.ledger()
                .record_cost("subj-1", &month, Tier::Fallback, 0.001)
                .await
                .unwrap();
        }

        let status = gate.check_budget("subj-1").await.unwrap();
        assert!(status.fallback_allowed);
    }
}
