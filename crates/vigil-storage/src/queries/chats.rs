// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat CRUD operations.

use rusqlite::params;
use vigil_core::VigilError;

use crate::database::Database;
use crate::models::Chat;

fn row_to_chat(row: &rusqlite::Row<'_>) -> Result<Chat, rusqlite::Error> {
    Ok(Chat {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        label: row.get(2)?,
        is_group: row.get(3)?,
        platform: row.get(4)?,
        last_activity_at: row.get(5)?,
    })
}

/// Insert a chat, or refresh its label and last-activity timestamp.
pub async fn upsert_chat(db: &Database, chat: &Chat) -> Result<(), VigilError> {
    let chat = chat.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chats (id, subject_id, label, is_group, platform, last_activity_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     label = excluded.label,
                     last_activity_at = COALESCE(excluded.last_activity_at, chats.last_activity_at)",
                params![
                    chat.id,
                    chat.subject_id,
                    chat.label,
                    chat.is_group,
                    chat.platform,
                    chat.last_activity_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a chat by id.
pub async fn get_chat(db: &Database, id: &str) -> Result<Option<Chat>, VigilError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, subject_id, label, is_group, platform, last_activity_at
                 FROM chats WHERE id = ?1",
                params![id],
                row_to_chat,
            );
            match result {
                Ok(chat) => Ok(Some(chat)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all chats belonging to a subject.
pub async fn list_chats_for_subject(
    db: &Database,
    subject_id: &str,
) -> Result<Vec<Chat>, VigilError> {
    let subject_id = subject_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_id, label, is_group, platform, last_activity_at
                 FROM chats WHERE subject_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![subject_id], row_to_chat)?;
            let mut chats = Vec::new();
            for row in rows {
                chats.push(row?);
            }
            Ok(chats)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp a chat's last-activity timestamp.
pub async fn touch_activity(db: &Database, chat_id: &str, at: &str) -> Result<(), VigilError> {
    let chat_id = chat_id.to_string();
    let at = at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE chats SET last_activity_at = ?2 WHERE id = ?1",
                params![chat_id, at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chat(id: &str, subject_id: &str) -> Chat {
        Chat {
            id: id.into(),
            subject_id: subject_id.into(),
            label: "Group chat".into(),
            is_group: true,
            platform: "discord".into(),
            last_activity_at: None,
        }
    }

    #[tokio::test]
    async fn upsert_and_get_chat() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_chat(&db, &sample_chat("chat-1", "subj-1")).await.unwrap();

        let chat = get_chat(&db, "chat-1").await.unwrap().unwrap();
        assert_eq!(chat.subject_id, "subj-1");
        assert!(chat.is_group);
        assert_eq!(chat.platform, "discord");
    }

    #[tokio::test]
    async fn upsert_preserves_activity_when_none() {
        let db = Database::open_in_memory().await.unwrap();
        let mut chat = sample_chat("chat-1", "subj-1");
        chat.last_activity_at = Some("2026-03-01T10:00:00.000Z".into());
        upsert_chat(&db, &chat).await.unwrap();

        // Upsert with no activity timestamp keeps the existing one.
        chat.last_activity_at = None;
        upsert_chat(&db, &chat).await.unwrap();
        let loaded = get_chat(&db, "chat-1").await.unwrap().unwrap();
        assert_eq!(
            loaded.last_activity_at.as_deref(),
            Some("2026-03-01T10:00:00.000Z")
        );
    }

    #[tokio::test]
    async fn list_chats_filters_by_subject() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_chat(&db, &sample_chat("chat-1", "subj-a")).await.unwrap();
        upsert_chat(&db, &sample_chat("chat-2", "subj-a")).await.unwrap();
        upsert_chat(&db, &sample_chat("chat-3", "subj-b")).await.unwrap();

        let chats = list_chats_for_subject(&db, "subj-a").await.unwrap();
        assert_eq!(chats.len(), 2);
    }

    #[tokio::test]
    async fn touch_activity_updates_timestamp() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_chat(&db, &sample_chat("chat-1", "subj-1")).await.unwrap();
        touch_activity(&db, "chat-1", "2026-03-02T09:00:00.000Z")
            .await
            .unwrap();
        let chat = get_chat(&db, "chat-1").await.unwrap().unwrap();
        assert_eq!(
            chat.last_activity_at.as_deref(),
            Some("2026-03-02T09:00:00.000Z")
        );
    }
}
