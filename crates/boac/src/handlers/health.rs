//! Health check endpoints for Kubernetes liveness and readiness checks.
//!
//! - `/livez` - Basic liveness check (immediate 200)
//! - `/healthz` - Storage round trip

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

/// GET /livez - Basic liveness check.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Reads from storage to confirm the backend answers.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Response {
    match state.topics.list_topics(false).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "healthy": true }))).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "healthy": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
