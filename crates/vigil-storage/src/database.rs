// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::info;
use vigil_core::VigilError;

/// Convert a tokio-rusqlite error into VigilError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> VigilError {
    VigilError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database behind the single background writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled and run
    /// all pending migrations.
    pub async fn open(path: &str) -> Result<Self, VigilError> {
        Self::open_with(path, true).await
    }

    /// Open with an explicit WAL-mode choice.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, VigilError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VigilError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| VigilError::Storage {
                source: Box::new(e),
            })?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode={journal_mode};
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;"
        );
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(crate::migrations::run_migrations)
            .await
            .map_err(|e| VigilError::Storage {
                source: Box::new(e),
            })?;

        info!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database with migrations applied (tests and tooling).
    pub async fn open_in_memory() -> Result<Self, VigilError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| VigilError::Storage {
                source: Box::new(e),
            })?;
        conn.call(crate::migrations::run_migrations)
            .await
            .map_err(|e| VigilError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Round-trip a trivial query, for health checks.
    pub async fn ping(&self) -> Result<(), VigilError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), VigilError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        // All pipeline tables exist after migration.
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                     AND name IN ('subjects', 'chats', 'messages', 'scan_checkpoints',
                                  'small_signals', 'smart_decisions', 'findings', 'usage_meter')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 8);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();

        // Re-opening an already-migrated database succeeds.
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/deeper/test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        assert!(db_path.exists());
    }
}
