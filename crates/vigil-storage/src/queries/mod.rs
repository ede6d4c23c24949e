// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per storage entity.

pub mod chats;
pub mod checkpoints;
pub mod decisions;
pub mod findings;
pub mod messages;
pub mod signals;
pub mod subjects;
