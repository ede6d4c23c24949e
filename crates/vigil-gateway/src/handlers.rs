// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers: POST /v1/ingest, POST /v1/scan, GET /health.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use vigil_core::HealthStatus;
use vigil_pipeline::ingest::IncomingMessage;

use crate::server::GatewayState;

/// Request body for POST /v1/ingest.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// Normalized messages from the ingestion collaborator.
    pub messages: Vec<IncomingMessage>,
}

/// Request body for POST /v1/scan.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub subject_id: String,
    /// Bypass the scheduler's interval gating.
    #[serde(default)]
    pub force: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health of one adapter, as reported by its health check.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

/// POST /v1/ingest
///
/// Persists and routes a batch of normalized messages through the pipeline.
pub async fn post_ingest(
    State(state): State<GatewayState>,
    Json(body): Json<IngestRequest>,
) -> Response {
    match state.pipeline.ingest(body.messages).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = %e, "ingest failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /v1/scan
///
/// Runs an on-demand scan for every conversation of a subject.
pub async fn post_scan(
    State(state): State<GatewayState>,
    Json(body): Json<ScanRequest>,
) -> Response {
    match state.pipeline.run_scan(&body.subject_id, body.force).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = %e, subject_id = %body.subject_id, "on-demand scan failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health (unauthenticated)
///
/// Reports process uptime, storage reachability, and each adapter's
/// health-check result.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let mut adapters = Vec::new();
    let mut degraded = false;

    match state.pipeline.db().ping().await {
        Ok(()) => adapters.push(AdapterHealth {
            name: "storage".to_string(),
            status: "healthy".to_string(),
        }),
        Err(e) => {
            degraded = true;
            adapters.push(AdapterHealth {
                name: "storage".to_string(),
                status: format!("unhealthy: {e}"),
            });
        }
    }

    for adapter in &state.adapters {
        let status = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => "healthy".to_string(),
            Ok(HealthStatus::Degraded(reason)) => {
                degraded = true;
                format!("degraded: {reason}")
            }
            Ok(HealthStatus::Unhealthy(reason)) => {
                degraded = true;
                format!("unhealthy: {reason}")
            }
            Err(e) => {
                degraded = true;
                format!("unhealthy: {e}")
            }
        };
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            status,
        });
    }

    let body = HealthResponse {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        adapters,
    };
    (StatusCode::OK, Json(body)).into_response()
}
