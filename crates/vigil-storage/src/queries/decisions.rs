// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Smart decision (Tier-2 output) operations.

use std::str::FromStr;

use rusqlite::params;
use vigil_core::{Action, ThreatType, VigilError};

use crate::database::Database;
use crate::models::SmartDecisionRow;

fn row_to_decision(row: &rusqlite::Row<'_>) -> Result<SmartDecisionRow, rusqlite::Error> {
    let threat_type: String = row.get(6)?;
    let action: String = row.get(8)?;
    let key_reasons: String = row.get(9)?;
    let evidence: String = row.get(10)?;
    Ok(SmartDecisionRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        subject_id: row.get(2)?,
        window_from: row.get(3)?,
        window_to: row.get(4)?,
        final_risk_score: row.get::<_, i64>(5)? as u8,
        threat_type: ThreatType::from_str(&threat_type).unwrap_or(ThreatType::None),
        confidence: row.get(7)?,
        action: Action::from_str(&action).unwrap_or(Action::Ignore),
        key_reasons: serde_json::from_str(&key_reasons).unwrap_or_default(),
        evidence_message_ids: serde_json::from_str(&evidence).unwrap_or_default(),
        used_fallback: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Persist a Tier-2 decision.
pub async fn insert_decision(db: &Database, decision: &SmartDecisionRow) -> Result<(), VigilError> {
    let d = decision.clone();
    let reasons_json = serde_json::to_string(&d.key_reasons).map_err(|e| VigilError::Storage {
        source: Box::new(e),
    })?;
    let evidence_json =
        serde_json::to_string(&d.evidence_message_ids).map_err(|e| VigilError::Storage {
            source: Box::new(e),
        })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO smart_decisions
                     (id, chat_id, subject_id, window_from, window_to, final_risk_score,
                      threat_type, confidence, action, key_reasons, evidence_message_ids,
                      used_fallback, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    d.id,
                    d.chat_id,
                    d.subject_id,
                    d.window_from,
                    d.window_to,
                    d.final_risk_score as i64,
                    d.threat_type.to_string(),
                    d.confidence,
                    d.action.to_string(),
                    reasons_json,
                    evidence_json,
                    d.used_fallback,
                    d.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get decisions for a chat, newest first.
pub async fn get_decisions_for_chat(
    db: &Database,
    chat_id: &str,
) -> Result<Vec<SmartDecisionRow>, VigilError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, subject_id, window_from, window_to, final_risk_score,
                        threat_type, confidence, action, key_reasons, evidence_message_ids,
                        used_fallback, created_at
                 FROM smart_decisions WHERE chat_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![chat_id], row_to_decision)?;
            let mut decisions = Vec::new();
            for row in rows {
                decisions.push(row?);
            }
            Ok(decisions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
