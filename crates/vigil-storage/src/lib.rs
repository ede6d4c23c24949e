// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Vigil escalation pipeline.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed CRUD operations for
//! subjects, chats, messages, scan checkpoints, small signals, smart
//! decisions, and findings. Checkpoint and usage-meter mutations are
//! single-statement atomic upserts -- the datastore is the serialization
//! point, not in-process locks.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
