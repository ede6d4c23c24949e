// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service wiring: storage, adapters, pipeline, scheduler loop, gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vigil_anthropic::{AnthropicClient, AnthropicProvider};
use vigil_config::VigilConfig;
use vigil_core::types::{AdapterType, HealthStatus, Modality};
use vigil_core::{
    ClassifierProvider, MediaUnderstanding, Notifier, PluginAdapter, VigilError,
};
use vigil_cost::{BudgetGate, UsageLedger};
use vigil_gateway::{AuthConfig, GatewayState, ServerConfig, start_server};
use vigil_notify::{LogNotifier, WebhookNotifier};
use vigil_pipeline::Pipeline;
use vigil_scheduler::Scheduler;
use vigil_storage::Database;

/// Placeholder media adapter until a captioning collaborator is wired in.
///
/// Always yields no caption; the pipeline treats that as "nothing to add",
/// never as a failure.
struct NullMedia;

#[async_trait]
impl PluginAdapter for NullMedia {
    fn name(&self) -> &str {
        "null-media"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Media
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl MediaUnderstanding for NullMedia {
    async fn describe(
        &self,
        _media_ref: &str,
        _modality: Modality,
    ) -> Result<Option<String>, VigilError> {
        Ok(None)
    }
}

/// Run the service until the gateway exits.
pub async fn run(config: VigilConfig) -> Result<(), VigilError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone())),
        )
        .init();

    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;

    let api_key = config
        .anthropic
        .api_key
        .clone()
        .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
        .ok_or_else(|| {
            VigilError::Config(
                "anthropic.api_key is not set (config or ANTHROPIC_API_KEY)".to_string(),
            )
        })?;
    let client = AnthropicClient::new(api_key, config.anthropic.api_version.clone())?;
    let provider = Arc::new(AnthropicProvider::new(client));

    let notifier: Arc<dyn Notifier> = match &config.notify.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            config.notify.bearer_token.clone(),
        )?),
        None => Arc::new(LogNotifier),
    };

    let media = Arc::new(NullMedia);
    let budget = BudgetGate::new(UsageLedger::new(db.clone()), config.budget.clone());

    let pipeline = Arc::new(Pipeline::new(
        db.clone(),
        provider.clone() as Arc<dyn ClassifierProvider>,
        notifier,
        media.clone() as Arc<dyn MediaUnderstanding>,
        budget,
        &config,
    )?);

    // Scheduler loop: one tick every tick_interval_secs; a failed tick is
    // logged and the loop continues.
    let scheduler = Scheduler::new(pipeline.clone(), config.scheduler.clone());
    let tick_interval = Duration::from_secs(config.scheduler.tick_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match scheduler.run_tick().await {
                Ok(report) => {
                    if report.errors > 0 {
                        info!(errors = report.errors, "tick completed with absorbed errors");
                    }
                }
                Err(e) => error!(error = %e, "scheduler tick failed"),
            }
        }
    });

    let state = GatewayState {
        pipeline,
        adapters: vec![
            provider as Arc<dyn PluginAdapter>,
            media as Arc<dyn PluginAdapter>,
        ],
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        start_time: std::time::Instant::now(),
    };

    info!(name = %config.agent.name, "vigil service starting");
    start_server(
        &ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            bearer_token: config.gateway.bearer_token.clone(),
        },
        state,
    )
    .await
}
