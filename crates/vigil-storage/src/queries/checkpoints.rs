// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scan checkpoint operations.
//!
//! The checkpoint row is the serialization point for concurrent scan
//! triggers. Every mutation here is a single `INSERT .. ON CONFLICT DO
//! UPDATE` statement keyed by chat id -- never read-then-write -- so racing
//! writers resolve last-writer-wins at the datastore without explicit locks.

use rusqlite::params;
use vigil_core::VigilError;

use crate::database::Database;
use crate::models::{ScanCheckpoint, now_iso};

fn row_to_checkpoint(row: &rusqlite::Row<'_>) -> Result<ScanCheckpoint, rusqlite::Error> {
    let pending_json: String = row.get(5)?;
    let pending_batch: Vec<String> = serde_json::from_str(&pending_json).unwrap_or_default();
    Ok(ScanCheckpoint {
        chat_id: row.get(0)?,
        last_small_scan_at: row.get(1)?,
        last_smart_scan_at: row.get(2)?,
        last_activity_at: row.get(3)?,
        scan_interval_mins: row.get::<_, i64>(4)? as u32,
        pending_batch,
        updated_at: row.get(6)?,
    })
}

/// Get the checkpoint for a chat. Returns `None` if the chat was never scanned
/// or touched.
pub async fn get_checkpoint(
    db: &Database,
    chat_id: &str,
) -> Result<Option<ScanCheckpoint>, VigilError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT chat_id, last_small_scan_at, last_smart_scan_at, last_activity_at,
                        scan_interval_mins, pending_batch, updated_at
                 FROM scan_checkpoints WHERE chat_id = ?1",
                params![chat_id],
                row_to_checkpoint,
            );
            match result {
                Ok(cp) => Ok(Some(cp)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record conversation activity: stamps `last_activity_at`, creating the
/// checkpoint row if absent.
pub async fn record_activity(db: &Database, chat_id: &str, at: &str) -> Result<(), VigilError> {
    let chat_id = chat_id.to_string();
    let at = at.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scan_checkpoints (chat_id, last_activity_at, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     last_activity_at = excluded.last_activity_at,
                     updated_at = excluded.updated_at",
                params![chat_id, at, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a message id to the pending batch, creating the checkpoint if
/// absent. Uses the JSON1 `json_insert` append form so concurrent appends
/// never lose entries.
pub async fn append_pending(
    db: &Database,
    chat_id: &str,
    message_id: &str,
) -> Result<(), VigilError> {
    let chat_id = chat_id.to_string();
    let message_id = message_id.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scan_checkpoints (chat_id, pending_batch, updated_at)
                 VALUES (?1, json_array(?2), ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     pending_batch = json_insert(scan_checkpoints.pending_batch, '$[#]', ?2),
                     updated_at = excluded.updated_at",
                params![chat_id, message_id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp a completed Tier-1 scan: sets `last_small_scan_at` and clears the
/// pending batch in one statement.
pub async fn complete_small_scan(
    db: &Database,
    chat_id: &str,
    at: &str,
) -> Result<(), VigilError> {
    let chat_id = chat_id.to_string();
    let at = at.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scan_checkpoints (chat_id, last_small_scan_at, pending_batch, updated_at)
                 VALUES (?1, ?2, '[]', ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     last_small_scan_at = excluded.last_small_scan_at,
                     pending_batch = '[]',
                     updated_at = excluded.updated_at",
                params![chat_id, at, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp a completed Tier-2 scan.
pub async fn stamp_smart_scan(db: &Database, chat_id: &str, at: &str) -> Result<(), VigilError> {
    let chat_id = chat_id.to_string();
    let at = at.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scan_checkpoints (chat_id, last_smart_scan_at, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     last_smart_scan_at = excluded.last_smart_scan_at,
                     updated_at = excluded.updated_at",
                params![chat_id, at, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist the scheduler's chosen scan interval for external observability.
pub async fn store_interval(
    db: &Database,
    chat_id: &str,
    interval_mins: u32,
) -> Result<(), VigilError> {
    let chat_id = chat_id.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scan_checkpoints (chat_id, scan_interval_mins, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     scan_interval_mins = excluded.scan_interval_mins,
                     updated_at = excluded.updated_at",
                params![chat_id, interval_mins as i64, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
