// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vigil: mock adapters and an in-memory pipeline harness.

pub mod harness;
pub mod mock_media;
pub mod mock_notifier;
pub mod mock_provider;

pub use harness::TestPipeline;
pub use mock_media::MockMedia;
pub use mock_notifier::MockNotifier;
pub use mock_provider::MockProvider;
