//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers. The sampler thread holds its own handles to the
//! store and gauges; the two sides meet only through those.

use herakles_netspeed_exporter::{ExporterMetrics, HealthStats, IpAllowlist, SampleStore};
use prometheus::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub telemetry: Option<ExporterMetrics>,
    pub store: Arc<SampleStore>,
    pub allowlist: IpAllowlist,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Longest gap between successful cycles before /health reports unavailable.
    pub max_cycle_age: Duration,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
