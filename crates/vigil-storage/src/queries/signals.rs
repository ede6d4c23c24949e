// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small signal (Tier-1 output) operations.
//!
//! Signals are write-once per message; a duplicate Tier-1 pass over the same
//! message rewrites identical data via `INSERT OR REPLACE` rather than
//! failing, so racing scans are harmless.

use rusqlite::params;
use vigil_core::{RiskCode, VigilError};

use crate::database::Database;
use crate::models::SmallSignal;

fn row_to_signal(row: &rusqlite::Row<'_>) -> Result<SmallSignal, rusqlite::Error> {
    let codes_json: String = row.get(3)?;
    let risk_codes: Vec<RiskCode> = serde_json::from_str(&codes_json).unwrap_or_default();
    Ok(SmallSignal {
        message_id: row.get(0)?,
        chat_id: row.get(1)?,
        risk_score: row.get::<_, i64>(2)? as u8,
        risk_codes,
        escalate: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Persist a Tier-1 signal for one message.
pub async fn upsert_signal(db: &Database, signal: &SmallSignal) -> Result<(), VigilError> {
    let signal = signal.clone();
    let codes_json = serde_json::to_string(&signal.risk_codes).map_err(|e| {
        VigilError::Storage {
            source: Box::new(e),
        }
    })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO small_signals
                     (message_id, chat_id, risk_score, risk_codes, escalate, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    signal.message_id,
                    signal.chat_id,
                    signal.risk_score as i64,
                    codes_json,
                    signal.escalate,
                    signal.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get signals for a set of message ids.
pub async fn get_signals_for_messages(
    db: &Database,
    message_ids: &[String],
) -> Result<Vec<SmallSignal>, VigilError> {
    if message_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = message_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT message_id, chat_id, risk_score, risk_codes, escalate, created_at
                 FROM small_signals WHERE message_id IN ({placeholders})
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), row_to_signal)?;
            let mut signals = Vec::new();
            for row in rows {
                signals.push(row?);
            }
            Ok(signals)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all signals recorded for a chat.
pub async fn get_signals_for_chat(
    db: &Database,
    chat_id: &str,
) -> Result<Vec<SmallSignal>, VigilError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, chat_id, risk_score, risk_codes, escalate, created_at
                 FROM small_signals WHERE chat_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![chat_id], row_to_signal)?;
            let mut signals = Vec::new();
            for row in rows {
                signals.push(row?);
            }
            Ok(signals)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_iso;

    fn make_signal(message_id: &str, score: u8, codes: Vec<RiskCode>, escalate: bool) -> SmallSignal {
        SmallSignal {
            message_id: message_id.into(),
            chat_id: "c1".into(),
            risk_score: score,
            risk_codes: codes,
            escalate,
            created_at: now_iso(),
        }
    }

    #[tokio::test]
    async fn signal_round_trip_is_exact() {
        let db = Database::open_in_memory().await.unwrap();

        let signal = make_signal(
            "m1",
            55,
            vec![RiskCode::Meetup, RiskCode::Grooming],
            true,
        );
        upsert_signal(&db, &signal).await.unwrap();

        let loaded = get_signals_for_messages(&db, &["m1".to_string()])
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].risk_score, 55);
        assert_eq!(loaded[0].risk_codes, vec![RiskCode::Meetup, RiskCode::Grooming]);
        assert!(loaded[0].escalate);
    }

    #[tokio::test]
    async fn duplicate_scan_rewrites_not_fails() {
        let db = Database::open_in_memory().await.unwrap();

        upsert_signal(&db, &make_signal("m1", 10, vec![], false))
            .await
            .unwrap();
        upsert_signal(&db, &make_signal("m1", 10, vec![], false))
            .await
            .unwrap();

        let loaded = get_signals_for_chat(&db, "c1").await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn signals_for_chat_filters() {
        let db = Database::open_in_memory().await.unwrap();

        upsert_signal(&db, &make_signal("m1", 10, vec![], false))
            .await
            .unwrap();
        let mut other = make_signal("m2", 20, vec![], false);
        other.chat_id = "c2".into();
        upsert_signal(&db, &other).await.unwrap();

        let loaded = get_signals_for_chat(&db, "c1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].message_id, "m1");
    }

    #[tokio::test]
    async fn empty_id_list_returns_empty() {
        let db = Database::open_in_memory().await.unwrap();
        let loaded = get_signals_for_messages(&db, &[]).await.unwrap();
        assert!(loaded.is_empty());
    }
}
