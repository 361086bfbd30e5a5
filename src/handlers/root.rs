//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that lists the available
//! endpoints and the sampler settings.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    let sampler = state.config.sampler_config();
    let health_line = if state.config.enable_health.unwrap_or(true) {
        "  /health   Sampler health and request statistics\n"
    } else {
        ""
    };

    (
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "Herakles Netspeed Exporter {version}\n\
             Uptime: {hours}h {minutes}m {seconds}s\n\n\
             Endpoints:\n\
             \x20 /metrics  Prometheus metrics\n\
             {health_line}\n\
             Sampling every {:?}, tracking up to {} interfaces, forgetting after {:?}\n\
             Interfaces tracked: {}\n\n\
             {FOOTER_TEXT}\n",
            sampler.interval,
            sampler.max_interfaces,
            sampler.stale_after,
            state.store.len(),
        ),
    )
}
