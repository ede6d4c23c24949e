// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adaptive scan scheduling for the Vigil escalation pipeline.
//!
//! The cadence state machine lives in [`interval`]; the periodic runner over
//! every monitored conversation lives in [`tick`].

pub mod interval;
pub mod tick;

pub use interval::{Cadence, cadence, in_active_hours, interval_mins, optimal_interval};
pub use tick::{Scheduler, TickReport};
