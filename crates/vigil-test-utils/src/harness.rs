// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory pipeline harness.
//!
//! Wires a real [`Pipeline`] over an in-memory database and the mock
//! adapters, with seeding helpers for subjects, chats, and messages.

use std::sync::Arc;

use vigil_config::VigilConfig;
use vigil_core::{ClassifierProvider, MediaUnderstanding, Notifier};
use vigil_cost::{BudgetGate, UsageLedger};
use vigil_pipeline::Pipeline;
use vigil_storage::Database;
use vigil_storage::models::{Chat, MessageRow, Subject};
use vigil_storage::queries::{chats, messages, subjects};

use crate::mock_media::MockMedia;
use crate::mock_notifier::MockNotifier;
use crate::mock_provider::MockProvider;

/// A fully-wired pipeline over an in-memory database and mock adapters.
pub struct TestPipeline {
    pub db: Database,
    pub provider: Arc<MockProvider>,
    pub notifier: Arc<MockNotifier>,
    pub media: Arc<MockMedia>,
    pub config: VigilConfig,
    pipeline: Arc<Pipeline>,
}

impl TestPipeline {
    /// Build a harness with default configuration.
    pub async fn new() -> Self {
        Self::with_config(VigilConfig::default()).await
    }

    /// Build a harness with custom configuration.
    pub async fn with_config(config: VigilConfig) -> Self {
        let db = Database::open_in_memory().await.expect("in-memory db");
        let provider = Arc::new(MockProvider::new());
        let notifier = Arc::new(MockNotifier::new());
        let media = Arc::new(MockMedia::new());

        let budget = BudgetGate::new(UsageLedger::new(db.clone()), config.budget.clone());
        let pipeline = Pipeline::new(
            db.clone(),
            provider.clone() as Arc<dyn ClassifierProvider>,
            notifier.clone() as Arc<dyn Notifier>,
            media.clone() as Arc<dyn MediaUnderstanding>,
            budget,
            &config,
        )
        .expect("pipeline assembly");

        Self {
            db,
            provider,
            notifier,
            media,
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// The assembled pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// A shareable handle to the assembled pipeline.
    pub fn pipeline_arc(&self) -> Arc<Pipeline> {
        self.pipeline.clone()
    }

    /// Seed a subject row.
    pub async fn seed_subject(&self, id: &str, birth_year: Option<i32>, monitoring_enabled: bool) {
        subjects::upsert_subject(
            &self.db,
            &Subject {
                id: id.into(),
                birth_year,
                monitoring_enabled,
            },
        )
        .await
        .expect("seed subject");
    }

    /// Seed a chat row and return it.
    pub async fn seed_chat(&self, chat_id: &str, subject_id: &str) -> Chat {
        let chat = Chat {
            id: chat_id.into(),
            subject_id: subject_id.into(),
            label: format!("chat {chat_id}"),
            is_group: false,
            platform: "test".into(),
            last_activity_at: None,
        };
        chats::upsert_chat(&self.db, &chat).await.expect("seed chat");
        chat
    }

    /// Seed a message row and return it.
    pub async fn seed_message(
        &self,
        id: &str,
        chat_id: &str,
        subject_id: &str,
        body: &str,
        created_at: &str,
    ) -> MessageRow {
        let row = MessageRow {
            id: id.into(),
            chat_id: chat_id.into(),
            subject_id: subject_id.into(),
            sender_role: "contact".into(),
            modality: "text".into(),
            body: Some(body.into()),
            caption: None,
            media_ref: None,
            created_at: created_at.into(),
        };
        messages::insert_message(&self.db, &row)
            .await
            .expect("seed message");
        row
    }
}
