// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding emitter.
//!
//! Converts an alerting Tier-2 decision into a persisted finding and issues a
//! best-effort guardian notification. The finding row is the durable source
//! of truth: notification failure is logged and never rolls it back.

use tracing::{info, warn};
use vigil_core::types::{GuardianNotice, SubjectId};
use vigil_core::{RiskLevel, VigilError};
use vigil_storage::models::{FindingRow, SmartDecisionRow, now_iso};
use vigil_storage::queries::findings;

use crate::Pipeline;

impl Pipeline {
    /// Persist a finding for an alerting decision and notify the guardian.
    pub async fn emit_finding(
        &self,
        decision: &SmartDecisionRow,
    ) -> Result<FindingRow, VigilError> {
        let finding = FindingRow {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: decision.subject_id.clone(),
            decision_id: decision.id.clone(),
            threat_detected: true,
            risk_level: RiskLevel::from_score(decision.final_risk_score),
            threat_types: vec![decision.threat_type],
            explanation: decision.key_reasons.join("; "),
            handled: false,
            handled_at: None,
            created_at: now_iso(),
        };

        findings::insert_finding(&self.db, &finding).await?;
        info!(
            finding_id = %finding.id,
            subject_id = %finding.subject_id,
            risk_level = %finding.risk_level,
            "finding persisted"
        );

        let notice = GuardianNotice {
            subject_id: SubjectId(finding.subject_id.clone()),
            finding_id: finding.id.clone(),
            risk_level: finding.risk_level,
            threat_types: finding.threat_types.clone(),
            explanation: finding.explanation.clone(),
        };
        if let Err(e) = self.notifier.notify(&notice).await {
            warn!(
                finding_id = %finding.id,
                error = %e,
                "guardian notification failed; finding remains persisted"
            );
        }

        Ok(finding)
    }
}
