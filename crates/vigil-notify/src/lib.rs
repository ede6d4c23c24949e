// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guardian notification adapters: webhook delivery and a logging no-op.

pub mod webhook;

pub use webhook::{LogNotifier, WebhookNotifier};
