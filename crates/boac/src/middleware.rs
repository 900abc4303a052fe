use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

/// Logs every API request as `{remote_addr} {method} {path} {status}`.
///
/// Server errors log at error, client errors at warn, the rest at debug.
pub async fn log_api_request(request: Request, next: Next) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        tracing::error!("{remote_addr} {method} {path} {}", status.as_u16());
    } else if status.is_client_error() {
        tracing::warn!("{remote_addr} {method} {path} {}", status.as_u16());
    } else {
        tracing::debug!("{remote_addr} {method} {path} {}", status.as_u16());
    }
    response
}
