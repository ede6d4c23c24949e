// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication middleware for the /v1 routes.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Authentication configuration for the gateway.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` disables auth.
    pub bearer_token: Option<String>,
}

/// Reject /v1 requests without the configured bearer token.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &auth.bearer_token {
        let provided = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        let valid = provided
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);
        if !valid {
            return (StatusCode::UNAUTHORIZED, "invalid or missing bearer token").into_response();
        }
    }
    next.run(request).await
}
