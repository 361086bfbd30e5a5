//! Herakles Network Speed Exporter Library
//!
//! This library contains the sampling engine behind the exporter. It reads
//! cumulative interface counters, keeps the previous reading per interface in
//! a bounded store, and publishes throughput in bits per second together with
//! the raw packet, error and drop counters.
//!
//! # Features
//!
//! - **Sample Store**: last reading per interface, evicted by age and by count
//! - **Sampling Engine**: fixed-interval loop with backoff on source failures
//! - **Pluggable seams**: counter source, interface metadata and gauge sink are
//!   traits, so the engine runs without a live kernel feed
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use herakles_netspeed_exporter::{
//!     NetworkMetrics, ProcNetDev, SampleStore, Sampler, SamplerConfig, SysfsResolver,
//! };
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let metrics = NetworkMetrics::new(&registry).unwrap();
//!
//! let sampler = Sampler::new(
//!     Arc::new(SampleStore::new()),
//!     Box::new(ProcNetDev::default()),
//!     Arc::new(SysfsResolver::default()),
//!     Arc::new(metrics),
//!     SamplerConfig::default(),
//! );
//! let handle = sampler.spawn().unwrap();
//! # drop(handle);
//! ```

pub mod allowlist;
pub mod health_stats;
pub mod iface;
pub mod metrics;
pub mod netdev;
pub mod sample_store;
pub mod sampler;

// Re-export main types for convenience
pub use allowlist::IpAllowlist;
pub use health_stats::HealthStats;
pub use iface::{InterfaceInfo, InterfaceResolver, SysfsResolver};
pub use metrics::{Direction, ExporterMetrics, Family, GaugeSink, NetworkMetrics};
pub use netdev::{NetDevStats, ProcNetDev};
pub use sample_store::{InterfaceSample, SampleStore};
pub use sampler::{CounterSource, CycleReport, Sampler, SamplerConfig, SamplerError};
