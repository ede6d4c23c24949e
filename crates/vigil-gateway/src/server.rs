// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Routes:
//! - `POST /v1/ingest` (auth) -- normalized message push
//! - `POST /v1/scan` (auth) -- on-demand scan trigger
//! - `GET /health` (public) -- adapter health for process supervision

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use vigil_core::{PluginAdapter, VigilError};
use vigil_pipeline::Pipeline;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The assembled escalation pipeline.
    pub pipeline: Arc<Pipeline>,
    /// Adapters surfaced on the public health endpoint.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors GatewayConfig from vigil-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub bearer_token: Option<String>,
}

/// Build the gateway router over the given state.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/ingest", post(handlers::post_ingest))
        .route("/v1/scan", post(handlers::post_scan))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Bind and serve the gateway.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), VigilError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VigilError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");
    serve(listener, state).await
}

/// Serve the gateway on an already-bound listener (tests bind port 0).
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: GatewayState,
) -> Result<(), VigilError> {
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| VigilError::Internal(format!("gateway server error: {e}")))
}
