// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude classifier provider adapter for Vigil.
//!
//! Provides [`AnthropicClient`] for Messages API communication and
//! [`AnthropicProvider`], the [`vigil_core::ClassifierProvider`]
//! implementation used by all three pipeline tiers.

pub mod adapter;
pub mod client;
pub mod types;

pub use adapter::AnthropicProvider;
pub use client::AnthropicClient;
