// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-demand scan trigger.
//!
//! Entry point for user-triggered scans: runs Tier-1 and then unconditionally
//! Tier-2 for every conversation of a subject over the trailing window.
//! `force` bypasses the scheduler's interval gating; budget gating of the
//! fallback tier still applies.

use serde::Serialize;
use tracing::{info, warn};
use vigil_core::VigilError;
use vigil_storage::models::parse_iso;
use vigil_storage::queries::{chats, checkpoints, messages, subjects};

use crate::Pipeline;
use crate::small::SmallScanResult;
use crate::smart::SmartScanResult;

/// Outcome of an on-demand scan.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanReport {
    pub subject_id: String,
    /// Set when the scan was short-circuited (unknown subject, disabled).
    pub skipped: Option<String>,
    pub chats_scanned: usize,
    pub small_runs: usize,
    pub smart_runs: usize,
}

impl Pipeline {
    /// Run an on-demand scan for every conversation of a subject.
    pub async fn run_scan(&self, subject_id: &str, force: bool) -> Result<ScanReport, VigilError> {
        let mut report = ScanReport {
            subject_id: subject_id.to_string(),
            ..ScanReport::default()
        };

        let Some(subject) = subjects::get_subject(&self.db, subject_id).await? else {
            report.skipped = Some("unknown subject".to_string());
            return Ok(report);
        };
        if !subject.monitoring_enabled {
            report.skipped = Some("monitoring disabled".to_string());
            return Ok(report);
        }

        let now = chrono::Utc::now();
        let window_from = now - chrono::Duration::minutes(self.window_mins as i64);

        for chat in chats::list_chats_for_subject(&self.db, subject_id).await? {
            report.chats_scanned += 1;
            let checkpoint = checkpoints::get_checkpoint(&self.db, &chat.id).await?;

            // Tier-1: forced scans bypass the interval gate.
            let (last_small, interval_mins) = match &checkpoint {
                Some(cp) => (cp.last_small_scan_at.clone(), cp.scan_interval_mins),
                None => (None, 0),
            };
            let due = force
                || match last_small.as_deref().and_then(parse_iso) {
                    Some(last) => (now - last).num_minutes() >= interval_mins as i64,
                    None => true,
                };

            let mut escalated = false;
            if due {
                let new_messages =
                    messages::get_after(&self.db, &chat.id, last_small.as_deref()).await?;
                if !new_messages.is_empty() {
                    match self.run_small(&chat, &new_messages).await {
                        Ok(SmallScanResult::Completed { escalated: e, .. }) => {
                            report.small_runs += 1;
                            escalated = e;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(chat_id = %chat.id, error = %e, "on-demand tier-1 failed");
                        }
                    }
                }
            }

            // Tier-2 runs unconditionally over the trailing window; skip only
            // when the Tier-1 escalation just ran it.
            if escalated {
                report.smart_runs += 1;
            } else {
                match self.run_smart(&chat, window_from, now).await {
                    Ok(SmartScanResult::Decided(_)) => report.smart_runs += 1,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(chat_id = %chat.id, error = %e, "on-demand tier-2 failed");
                    }
                }
            }
        }

        info!(
            subject_id,
            force,
            chats = report.chats_scanned,
            small_runs = report.small_runs,
            smart_runs = report.smart_runs,
            "on-demand scan complete"
        );
        Ok(report)
    }
}
