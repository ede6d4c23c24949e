// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding (guardian-visible alert) operations.

use std::str::FromStr;

use rusqlite::params;
use vigil_core::{RiskLevel, ThreatType, VigilError};

use crate::database::Database;
use crate::models::{FindingRow, now_iso};

fn row_to_finding(row: &rusqlite::Row<'_>) -> Result<FindingRow, rusqlite::Error> {
    let risk_level: String = row.get(4)?;
    let threat_types: String = row.get(5)?;
    Ok(FindingRow {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        decision_id: row.get(2)?,
        threat_detected: row.get(3)?,
        risk_level: RiskLevel::from_str(&risk_level).unwrap_or(RiskLevel::Low),
        threat_types: serde_json::from_str::<Vec<ThreatType>>(&threat_types).unwrap_or_default(),
        explanation: row.get(6)?,
        handled: row.get(7)?,
        handled_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Persist a finding.
pub async fn insert_finding(db: &Database, finding: &FindingRow) -> Result<(), VigilError> {
    let f = finding.clone();
    let threats_json = serde_json::to_string(&f.threat_types).map_err(|e| VigilError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO findings
                     (id, subject_id, decision_id, threat_detected, risk_level, threat_types,
                      explanation, handled, handled_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    f.id,
                    f.subject_id,
                    f.decision_id,
                    f.threat_detected,
                    f.risk_level.to_string(),
                    threats_json,
                    f.explanation,
                    f.handled,
                    f.handled_at,
                    f.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List findings for a subject, newest first.
pub async fn list_findings_for_subject(
    db: &Database,
    subject_id: &str,
) -> Result<Vec<FindingRow>, VigilError> {
    let subject_id = subject_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_id, decision_id, threat_detected, risk_level, threat_types,
                        explanation, handled, handled_at, created_at
                 FROM findings WHERE subject_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![subject_id], row_to_finding)?;
            let mut findings = Vec::new();
            for row in rows {
                findings.push(row?);
            }
            Ok(findings)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a finding as handled by a guardian.
pub async fn mark_handled(db: &Database, finding_id: &str) -> Result<(), VigilError> {
    let finding_id = finding_id.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE findings SET handled = 1, handled_at = ?2 WHERE id = ?1",
                params![finding_id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_finding(id: &str) -> FindingRow {
        FindingRow {
            id: id.into(),
            subject_id: "subj-1".into(),
            decision_id: "d1".into(),
            threat_detected: true,
            risk_level: RiskLevel::High,
            threat_types: vec![ThreatType::Grooming],
            explanation: "age gap probing; secrecy pressure".into(),
            handled: false,
            handled_at: None,
            created_at: now_iso(),
        }
    }

    #[tokio::test]
    async fn finding_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        insert_finding(&db, &make_finding("f1")).await.unwrap();

        let findings = list_findings_for_subject(&db, "subj-1").await.unwrap();
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.risk_level, RiskLevel::High);
        assert_eq!(f.threat_types, vec![ThreatType::Grooming]);
        assert!(f.threat_detected);
        assert!(!f.handled);
    }

    #[tokio::test]
    async fn mark_handled_stamps_timestamp() {
        let db = Database::open_in_memory().await.unwrap();
        insert_finding(&db, &make_finding("f1")).await.unwrap();

        mark_handled(&db, "f1").await.unwrap();

        let findings = list_findings_for_subject(&db, "subj-1").await.unwrap();
        assert!(findings[0].handled);
        assert!(findings[0].handled_at.is_some());
    }

    #[tokio::test]
    async fn findings_scoped_to_subject() {
        let db = Database::open_in_memory().await.unwrap();
        insert_finding(&db, &make_finding("f1")).await.unwrap();
        let mut other = make_finding("f2");
        other.subject_id = "subj-2".into();
        insert_finding(&db, &other).await.unwrap();

        assert_eq!(list_findings_for_subject(&db, "subj-1").await.unwrap().len(), 1);
        assert_eq!(list_findings_for_subject(&db, "subj-2").await.unwrap().len(), 1);
    }
}
