//! Fallback for non-API paths: serves the front-end entry points and sends
//! migrated routes to the Vue app.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

/// 404 for unknown `/api/*` paths.
pub async fn api_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "The requested resource could not be found." })),
    )
        .into_response()
}

async fn serve_index(path: &str) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "Front-end entry point unavailable");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// Catch-all for front-end routes.
pub async fn front_end_route(State(state): State<AppState>, uri: Uri) -> Response {
    let config = &state.config;
    let Some(target) = state.redirects.resolve(uri.path(), uri.query()) else {
        return serve_index(&config.index_html).await;
    };

    match config.vue_localhost_base_url.as_deref() {
        Some(base_url) => {
            let location = format!("{}{target}", base_url.trim_end_matches('/'));
            tracing::debug!(from = %uri, to = %location, "Redirecting to Vue dev server");
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        None => serve_index(&config.index_html_vue).await,
    }
}
