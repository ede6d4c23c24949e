// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! Pricing verified from <https://docs.anthropic.com/en/docs/about-claude/pricing>
//! on 2026-03-01.
//!
//! Claude Haiku:  input=$0.80/MTok, output=$4.00/MTok
//! Claude Sonnet: input=$3.00/MTok, output=$15.00/MTok
//! Claude Opus:   input=$15.00/MTok, output=$75.00/MTok

use vigil_core::TokenUsage;

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone)]
pub struct ModelPricing {
    /// Cost per million input tokens.
    pub input_per_mtok: f64,
    /// Cost per million output tokens.
    pub output_per_mtok: f64,
}

/// Look up pricing for a given model identifier.
///
/// Matches on substrings: "opus", "haiku", "sonnet". Falls back to Sonnet
/// pricing for unknown models so cost tracking never silently drops records.
pub fn get_pricing(model: &str) -> ModelPricing {
    let lower = model.to_lowercase();

    if lower.contains("opus") {
        ModelPricing {
            input_per_mtok: 15.0,
            output_per_mtok: 75.0,
        }
    } else if lower.contains("haiku") {
        ModelPricing {
            input_per_mtok: 0.80,
            output_per_mtok: 4.0,
        }
    } else {
        // Default to Sonnet pricing (including unknown models).
        ModelPricing {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        }
    }
}

/// Calculate cost in USD for a given token usage and pricing.
pub fn calculate_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    let input = (usage.input_tokens as f64 / 1_000_000.0) * pricing.input_per_mtok;
    let output = (usage.output_tokens as f64 / 1_000_000.0) * pricing.output_per_mtok;
    input + output
}
