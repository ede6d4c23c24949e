// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.
//!
//! Messages are immutable once stored; the single exception is
//! caption/transcript backfill via [`set_caption`].

use rusqlite::params;
use vigil_core::VigilError;

use crate::database::Database;
use crate::models::MessageRow;

const MESSAGE_COLUMNS: &str =
    "id, chat_id, subject_id, sender_role, modality, body, caption, media_ref, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        subject_id: row.get(2)?,
        sender_role: row.get(3)?,
        modality: row.get(4)?,
        body: row.get(5)?,
        caption: row.get(6)?,
        media_ref: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &MessageRow) -> Result<(), VigilError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, chat_id, subject_id, sender_role, modality,
                                       body, caption, media_ref, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    msg.id,
                    msg.chat_id,
                    msg.subject_id,
                    msg.sender_role,
                    msg.modality,
                    msg.body,
                    msg.caption,
                    msg.media_ref,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Backfill a derived caption or transcript onto a media message.
pub async fn set_caption(db: &Database, message_id: &str, caption: &str) -> Result<(), VigilError> {
    let message_id = message_id.to_string();
    let caption = caption.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET caption = ?2 WHERE id = ?1",
                params![message_id, caption],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all messages in a chat within [from, to], chronological order.
pub async fn get_window(
    db: &Database,
    chat_id: &str,
    from: &str,
    to: &str,
) -> Result<Vec<MessageRow>, VigilError> {
    let chat_id = chat_id.to_string();
    let from = from.to_string();
    let to = to.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE chat_id = ?1 AND created_at >= ?2 AND created_at <= ?3
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![chat_id, from, to], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all messages in a chat strictly newer than `after` (all messages when
/// `after` is `None`), chronological order.
pub async fn get_after(
    db: &Database,
    chat_id: &str,
    after: Option<&str>,
) -> Result<Vec<MessageRow>, VigilError> {
    let chat_id = chat_id.to_string();
    let after = after.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match after {
                Some(after) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE chat_id = ?1 AND created_at > ?2
                         ORDER BY created_at ASC"
                    ))?;
                    let rows = stmt.query_map(params![chat_id, after], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE chat_id = ?1 ORDER BY created_at ASC"
                    ))?;
                    let rows = stmt.query_map(params![chat_id], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get messages by id, chronological order. Missing ids are skipped.
pub async fn get_by_ids(db: &Database, ids: &[String]) -> Result<Vec<MessageRow>, VigilError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE id IN ({placeholders}) ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(ids.iter()),
                row_to_message,
            )?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
