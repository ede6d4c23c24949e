// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound HTTP surface for Vigil.
//!
//! The gateway is the boundary between the external ingestion and
//! presentation collaborators and the escalation pipeline: it accepts
//! normalized message pushes, exposes the on-demand scan trigger, and
//! reports adapter health.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, ServerConfig, build_router, serve, start_server};
