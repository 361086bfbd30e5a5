//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Health check endpoint
//! - `/`: Landing page
//!
//! Every route sits behind the [`access::allowlist_guard`] middleware.

pub mod access;
pub mod health;
pub mod metrics;
pub mod root;

// Re-export handlers
pub use access::allowlist_guard;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;
