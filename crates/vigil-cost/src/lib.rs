// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage metering, pricing, and budget gating for the Vigil pipeline.
//!
//! This crate provides:
//! - **Usage meter**: per-subject, per-month cost and call-count ledger with
//!   atomic upsert-increment semantics
//! - **Budget gate**: soft/hard limit checks and Tier-3 fallback gating
//! - **Pricing**: model-specific cost calculation using official Anthropic pricing

pub mod budget;
pub mod meter;
pub mod pricing;

pub use budget::{BudgetGate, BudgetStatus};
pub use meter::UsageLedger;
