// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vigil escalation pipeline.
//!
//! This crate provides the foundational trait definitions, error type, and
//! domain types shared by every crate in the workspace. The pipeline,
//! scheduler, and gateway crates depend only on the seams defined here, never
//! on concrete providers.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VigilError;
pub use types::{
    Action, AdapterType, ChatId, HealthStatus, MessageId, Modality, RiskCode, RiskLevel,
    SenderRole, SubjectId, ThreatType, Tier, TokenUsage,
};

// Re-export adapter traits at crate root.
pub use traits::{ClassifierProvider, MediaUnderstanding, Notifier, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trip() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Provider,
            AdapterType::Storage,
            AdapterType::Notifier,
            AdapterType::Media,
        ] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }

    #[test]
    fn ids_are_clone_eq() {
        let sid = SubjectId("subject-1".into());
        assert_eq!(sid, sid.clone());

        let cid = ChatId("chat-1".into());
        assert_eq!(cid, cid.clone());

        let mid = MessageId("msg-1".into());
        assert_eq!(mid, mid.clone());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every adapter trait is reachable through
        // the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider<T: ClassifierProvider>() {}
        fn _assert_notifier<T: Notifier>() {}
        fn _assert_media<T: MediaUnderstanding>() {}
    }
}
