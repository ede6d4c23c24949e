// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subject CRUD operations.

use rusqlite::params;
use vigil_core::VigilError;

use crate::database::Database;
use crate::models::Subject;

/// Insert or update a subject.
pub async fn upsert_subject(db: &Database, subject: &Subject) -> Result<(), VigilError> {
    let subject = subject.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subjects (id, birth_year, monitoring_enabled)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     birth_year = excluded.birth_year,
                     monitoring_enabled = excluded.monitoring_enabled",
                params![subject.id, subject.birth_year, subject.monitoring_enabled],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a subject by id. Returns `None` for unknown subjects.
pub async fn get_subject(db: &Database, id: &str) -> Result<Option<Subject>, VigilError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, birth_year, monitoring_enabled FROM subjects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Subject {
                        id: row.get(0)?,
                        birth_year: row.get(1)?,
                        monitoring_enabled: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(subject) => Ok(Some(subject)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all subjects with monitoring enabled.
pub async fn list_monitored_subjects(db: &Database) -> Result<Vec<Subject>, VigilError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, birth_year, monitoring_enabled FROM subjects
                 WHERE monitoring_enabled = 1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    birth_year: row.get(1)?,
                    monitoring_enabled: row.get(2)?,
                })
            })?;
            let mut subjects = Vec::new();
            for row in rows {
                subjects.push(row?);
            }
            Ok(subjects)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
