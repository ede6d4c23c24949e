// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler tick over every monitored conversation.
//!
//! Each tick recomputes the cadence per conversation, persists it on the
//! checkpoint, runs a Tier-1 pass when one is due and new messages exist, and
//! runs the Tier-2 heartbeat as the safety net against missed escalations.
//! Per-chat failures are absorbed and logged; only a datastore-level failure
//! aborts the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use vigil_config::model::SchedulerConfig;
use vigil_core::VigilError;
use vigil_cost::BudgetStatus;
use vigil_pipeline::Pipeline;
use vigil_pipeline::small::SmallScanResult;
use vigil_pipeline::smart::SmartScanResult;
use vigil_storage::models::{Chat, parse_iso};
use vigil_storage::queries::{chats, checkpoints, messages, subjects};

use crate::interval;

/// Summary of one scheduler tick.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TickReport {
    pub subjects: usize,
    pub chats_checked: usize,
    pub small_runs: usize,
    pub smart_runs: usize,
    /// Per-chat failures absorbed during the tick.
    pub errors: usize,
}

/// Periodic scheduler over the escalation pipeline.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler over an assembled pipeline.
    pub fn new(pipeline: Arc<Pipeline>, config: SchedulerConfig) -> Self {
        Self { pipeline, config }
    }

    /// Run one tick at the current wall-clock time.
    pub async fn run_tick(&self) -> Result<TickReport, VigilError> {
        self.run_tick_at(Utc::now()).await
    }

    /// Run one tick at an explicit time (tests).
    pub async fn run_tick_at(&self, now: DateTime<Utc>) -> Result<TickReport, VigilError> {
        let db = self.pipeline.db();
        let mut report = TickReport::default();

        for subject in subjects::list_monitored_subjects(db).await? {
            report.subjects += 1;

            // One budget consult per subject per tick feeds every chat's
            // throttling decision.
            let budget_status = match self.pipeline.budget().check_budget(&subject.id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(subject_id = %subject.id, error = %e, "budget check failed");
                    report.errors += 1;
                    BudgetStatus::unconstrained()
                }
            };

            for chat in chats::list_chats_for_subject(db, &subject.id).await? {
                report.chats_checked += 1;
                if let Err(e) = self
                    .check_chat(&chat, budget_status.soft_limit_exceeded, now, &mut report)
                    .await
                {
                    warn!(chat_id = %chat.id, error = %e, "chat check failed, continuing tick");
                    report.errors += 1;
                }
            }
        }

        info!(
            subjects = report.subjects,
            chats = report.chats_checked,
            small_runs = report.small_runs,
            smart_runs = report.smart_runs,
            errors = report.errors,
            "scheduler tick complete"
        );
        Ok(report)
    }

    async fn check_chat(
        &self,
        chat: &Chat,
        over_soft_limit: bool,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), VigilError> {
        let db = self.pipeline.db();
        let checkpoint = checkpoints::get_checkpoint(db, &chat.id).await?;

        let last_activity = checkpoint
            .as_ref()
            .and_then(|cp| cp.last_activity_at.as_deref())
            .or(chat.last_activity_at.as_deref())
            .and_then(parse_iso);

        let interval_mins =
            interval::optimal_interval(now, last_activity, over_soft_limit, &self.config);
        checkpoints::store_interval(db, &chat.id, interval_mins).await?;

        // Tier-1: due by interval, and only when there is something new.
        let last_small = checkpoint
            .as_ref()
            .and_then(|cp| cp.last_small_scan_at.clone());
        let small_due = match last_small.as_deref().and_then(parse_iso) {
            Some(last) => (now - last).num_minutes() >= interval_mins as i64,
            None => true,
        };

        let mut escalated = false;
        if small_due {
            let new_messages = messages::get_after(db, &chat.id, last_small.as_deref()).await?;
            if !new_messages.is_empty()
                && let SmallScanResult::Completed { escalated: e, .. } =
                    self.pipeline.run_small(chat, &new_messages).await?
            {
                report.small_runs += 1;
                escalated = e;
            }
        }

        // Tier-2 heartbeat: catches escalations a missed webhook or failed
        // Tier-1 pass would otherwise lose.
        let heartbeat_due = match checkpoint
            .as_ref()
            .and_then(|cp| cp.last_smart_scan_at.as_deref())
            .and_then(parse_iso)
        {
            Some(last) => (now - last).num_minutes() >= self.config.heartbeat_interval_mins as i64,
            None => true,
        };
        let activity_recent = last_activity
            .map(|at| (now - at).num_minutes() <= self.config.heartbeat_lookback_mins as i64)
            .unwrap_or(false);

        if heartbeat_due && activity_recent && !escalated {
            let from = now - chrono::Duration::minutes(self.config.window_mins as i64);
            if let SmartScanResult::Decided(_) = self.pipeline.run_smart(chat, from, now).await? {
                report.smart_runs += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Tier, VigilError};
    use vigil_storage::models::{current_month_key, fmt_iso};
    use vigil_test_utils::TestPipeline;

    fn small_ok(message_id: &str) -> String {
        format!(
            r#"{{"messages": [{{"message_id": "{message_id}", "risk_score": 3,
                "risk_codes": [], "escalate": false}}], "escalate": false}}"#
        )
    }

    const SMART_IGNORE: &str = r#"{"final_risk_score": 2, "threat_type": "none",
        "confidence": 0.95, "action": "ignore", "key_reasons": [], "evidence_message_ids": []}"#;

    async fn scheduler_for(h: &TestPipeline) -> Scheduler {
        Scheduler::new(h.pipeline_arc(), h.config.scheduler.clone())
    }

    #[tokio::test]
    async fn tick_runs_tier1_on_new_messages() {
        let h = TestPipeline::new().await;
        h.seed_subject("s1", None, true).await;
        h.seed_chat("c1", "s1").await;

        let now = chrono::Utc::now();
        let msg_time = fmt_iso(&(now - chrono::Duration::minutes(2)));
        h.seed_message("m1", "c1", "s1", "hello", &msg_time).await;
        checkpoints::record_activity(&h.db, "c1", &msg_time).await.unwrap();

        h.provider.push_response(small_ok("m1")).await;
        // The never-scanned chat is also heartbeat-due.
        h.provider.push_response(SMART_IGNORE).await;

        let scheduler = scheduler_for(&h).await;
        let report = scheduler.run_tick_at(now).await.unwrap();

        assert_eq!(report.subjects, 1);
        assert_eq!(report.chats_checked, 1);
        assert_eq!(report.small_runs, 1);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn tick_skips_tier1_without_new_messages() {
        let h = TestPipeline::new().await;
        h.seed_subject("s1", None, true).await;
        h.seed_chat("c1", "s1").await;

        let now = chrono::Utc::now();
        // Last scan just happened and nothing is newer; no activity either.
        checkpoints::complete_small_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();
        checkpoints::stamp_smart_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();

        let scheduler = scheduler_for(&h).await;
        let report = scheduler.run_tick_at(now).await.unwrap();

        assert_eq!(report.small_runs, 0);
        assert_eq!(report.smart_runs, 0);
        assert_eq!(h.provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn heartbeat_runs_tier2_without_tier1_trigger() {
        let h = TestPipeline::new().await;
        h.seed_subject("s1", None, true).await;
        h.seed_chat("c1", "s1").await;

        let now = chrono::Utc::now();
        let msg_time = fmt_iso(&(now - chrono::Duration::minutes(10)));
        h.seed_message("m1", "c1", "s1", "hello", &msg_time).await;
        checkpoints::record_activity(&h.db, "c1", &msg_time).await.unwrap();
        // Tier-1 just ran (covering the message); the heartbeat is still due
        // because Tier-2 never has.
        checkpoints::complete_small_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();

        h.provider.push_response(SMART_IGNORE).await;

        let scheduler = scheduler_for(&h).await;
        let report = scheduler.run_tick_at(now).await.unwrap();

        assert_eq!(report.small_runs, 0);
        assert_eq!(report.smart_runs, 1);
    }

    #[tokio::test]
    async fn heartbeat_skipped_without_recent_activity() {
        let h = TestPipeline::new().await;
        h.seed_subject("s1", None, true).await;
        h.seed_chat("c1", "s1").await;

        let now = chrono::Utc::now();
        // Activity far outside the lookback window.
        let stale = fmt_iso(&(now - chrono::Duration::minutes(300)));
        h.seed_message("m1", "c1", "s1", "old", &stale).await;
        checkpoints::record_activity(&h.db, "c1", &stale).await.unwrap();
        checkpoints::complete_small_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();

        let scheduler = scheduler_for(&h).await;
        let report = scheduler.run_tick_at(now).await.unwrap();

        assert_eq!(report.smart_runs, 0);
        assert_eq!(h.provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn soft_limit_widens_persisted_interval() {
        let h = TestPipeline::new().await;
        h.seed_subject("s1", None, true).await;
        h.seed_chat("c1", "s1").await;

        let now = chrono::Utc::now();
        let msg_time = fmt_iso(&(now - chrono::Duration::minutes(2)));
        checkpoints::record_activity(&h.db, "c1", &msg_time).await.unwrap();
        checkpoints::complete_small_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();
        checkpoints::stamp_smart_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();

        // Push the subject over the soft limit.
        h.pipeline()
            .budget()
            .ledger()
            .record_cost("s1", &current_month_key(), Tier::Smart, 4.60)
            .await
            .unwrap();

        let scheduler = scheduler_for(&h).await;
        scheduler.run_tick_at(now).await.unwrap();

        let cp = checkpoints::get_checkpoint(&h.db, "c1").await.unwrap().unwrap();
        assert_eq!(
            cp.scan_interval_mins, h.config.scheduler.wide_interval_mins,
            "over-budget subject must be throttled to the wide interval"
        );
    }

    #[tokio::test]
    async fn per_chat_failure_does_not_abort_tick() {
        let h = TestPipeline::new().await;
        h.seed_subject("s1", None, true).await;
        h.seed_chat("c1", "s1").await;
        h.seed_chat("c2", "s1").await;

        let now = chrono::Utc::now();
        let msg_time = fmt_iso(&(now - chrono::Duration::minutes(2)));
        h.seed_message("m1", "c1", "s1", "hello", &msg_time).await;
        h.seed_message("m2", "c2", "s1", "hello", &msg_time).await;
        checkpoints::record_activity(&h.db, "c1", &msg_time).await.unwrap();
        checkpoints::record_activity(&h.db, "c2", &msg_time).await.unwrap();
        // Keep the heartbeat quiet so the scripted queue stays aligned.
        checkpoints::stamp_smart_scan(&h.db, "c1", &fmt_iso(&now)).await.unwrap();
        checkpoints::stamp_smart_scan(&h.db, "c2", &fmt_iso(&now)).await.unwrap();

        // c1's Tier-1 call fails fatally; c2's succeeds.
        h.provider
            .push_error(VigilError::Provider {
                message: "401 unauthorized".into(),
                source: None,
            })
            .await;
        h.provider.push_response(small_ok("m2")).await;

        let scheduler = scheduler_for(&h).await;
        let report = scheduler.run_tick_at(now).await.unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(report.small_runs, 1, "second chat must still be processed");
    }
}
