//! IP allowlist middleware.
//!
//! Rejects callers whose peer address is not on the configured allowlist
//! with `403 Forbidden` before any handler runs.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::warn;

use crate::state::SharedState;

/// Middleware enforcing the allowlist on every route.
pub async fn allowlist_guard(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.allowlist.is_allowed_addr(&peer) {
        return next.run(request).await;
    }

    warn!("Denied {} request from {}", request.uri().path(), peer.ip());
    state.health_stats.record_denied_request();
    (StatusCode::FORBIDDEN, "Access denied").into_response()
}
