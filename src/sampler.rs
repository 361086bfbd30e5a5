//! Sampling engine.
//!
//! The [`Sampler`] reads one counter snapshot per cycle, filters out loopback
//! and down interfaces, turns byte counter deltas into bits-per-second gauges,
//! republishes the raw packet/error/drop counters, and keeps the
//! [`SampleStore`] bounded.
//!
//! Counter resets and wraparounds are not special-cased: a counter that goes
//! backwards yields a negative rate, which is published as computed.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::health_stats::HealthStats;
use crate::iface::{description_or_default, InterfaceResolver};
use crate::metrics::{Direction, ExporterMetrics, Family, GaugeSink};
use crate::netdev::NetDevStats;
use crate::sample_store::{
    InterfaceSample, SampleStore, DEFAULT_MAX_INTERFACES, DEFAULT_STALE_AFTER,
};

const BITS_PER_BYTE: f64 = 8.0;

/// Errors raised while acquiring a counter snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("counter source {path} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("counter source {path} did not answer within {timeout:?}")]
    SourceStalled { path: PathBuf, timeout: Duration },
}

/// Feed of raw cumulative counters, one entry per interface.
pub trait CounterSource: Send + Sync {
    fn read_snapshot(&self) -> Result<Vec<(String, NetDevStats)>, SamplerError>;
}

/// Timing and bounds of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    pub interval: Duration,
    /// Wait after a failed snapshot before retrying.
    pub retry_backoff: Duration,
    pub stale_after: Duration,
    pub max_interfaces: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(1),
            stale_after: DEFAULT_STALE_AFTER,
            max_interfaces: DEFAULT_MAX_INTERFACES,
        }
    }
}

/// Outcome of one sampling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Interfaces present in the snapshot.
    pub seen: usize,
    /// Interfaces skipped as loopback, down or unresolvable.
    pub filtered: usize,
    /// Interfaces stored this cycle.
    pub stored: usize,
    /// Interfaces whose rate gauges were published.
    pub published: usize,
    pub evicted_stale: usize,
    pub evicted_capacity: usize,
    /// Store size after eviction.
    pub tracked: usize,
}

/// Bits per second between two cumulative byte counters.
///
/// A counter that moved backwards gives a negative result.
pub fn rate_bits_per_second(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    let delta = current as i128 - previous as i128;
    delta as f64 * BITS_PER_BYTE / elapsed_secs
}

/// The sampling loop and its collaborators.
pub struct Sampler {
    store: Arc<SampleStore>,
    source: Box<dyn CounterSource>,
    resolver: Arc<dyn InterfaceResolver>,
    sink: Arc<dyn GaugeSink>,
    config: SamplerConfig,
    health_stats: Option<Arc<HealthStats>>,
    telemetry: Option<ExporterMetrics>,
}

impl Sampler {
    pub fn new(
        store: Arc<SampleStore>,
        source: Box<dyn CounterSource>,
        resolver: Arc<dyn InterfaceResolver>,
        sink: Arc<dyn GaugeSink>,
        config: SamplerConfig,
    ) -> Self {
        Self {
            store,
            source,
            resolver,
            sink,
            config,
            health_stats: None,
            telemetry: None,
        }
    }

    /// Records cycle statistics into `stats`.
    pub fn with_health_stats(mut self, stats: Arc<HealthStats>) -> Self {
        self.health_stats = Some(stats);
        self
    }

    /// Publishes exporter_* telemetry on every cycle.
    pub fn with_telemetry(mut self, telemetry: ExporterMetrics) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    /// Reads one snapshot and processes it, stamped with the time the read
    /// completed.
    pub fn run_cycle(&self) -> Result<CycleReport, SamplerError> {
        let snapshot = self.source.read_snapshot()?;
        Ok(self.process_snapshot(snapshot, Instant::now()))
    }

    /// Processes an already acquired snapshot as if it was read at `now`.
    pub fn process_snapshot(
        &self,
        snapshot: Vec<(String, NetDevStats)>,
        now: Instant,
    ) -> CycleReport {
        let mut report = CycleReport {
            seen: snapshot.len(),
            ..Default::default()
        };

        for (name, counters) in snapshot {
            // Interfaces change state at runtime, so filtering is redone each cycle.
            match self.resolver.info(&name) {
                Some(info) if info.is_sampled() => {}
                Some(_) => {
                    report.filtered += 1;
                    continue;
                }
                None => {
                    debug!("Could not resolve flags for {}, skipping", name);
                    report.filtered += 1;
                    continue;
                }
            }

            let description = description_or_default(self.resolver.as_ref(), &name);
            self.sink.set_info(&name, &description);

            if let Some(prev) = self.store.get(&name) {
                if self.publish_rates(&name, &prev, &counters, now) {
                    report.published += 1;
                }
            }

            self.store
                .put(&name, InterfaceSample::new(&name, counters, now), now);
            report.stored += 1;
        }

        report.evicted_stale = self.store.evict_stale(now, self.config.stale_after);
        report.evicted_capacity = self
            .store
            .enforce_capacity(self.config.max_interfaces)
            .len();
        report.tracked = self.store.len();

        if report.evicted_stale > 0 || report.evicted_capacity > 0 {
            debug!(
                "Evicted {} stale and {} excess interfaces, {} tracked",
                report.evicted_stale, report.evicted_capacity, report.tracked
            );
        }

        report
    }

    /// Publishes the rate and counter gauges for one interface.
    ///
    /// Returns false without publishing when no time has passed since the
    /// previous sample.
    fn publish_rates(
        &self,
        name: &str,
        prev: &InterfaceSample,
        cur: &NetDevStats,
        now: Instant,
    ) -> bool {
        let elapsed = match now.checked_duration_since(prev.sampled_at) {
            Some(d) if !d.is_zero() => d.as_secs_f64(),
            _ => {
                debug!("Non-positive sample interval for {}, skipping rates", name);
                return false;
            }
        };

        let rx_speed =
            rate_bits_per_second(cur.receive_bytes, prev.counters.receive_bytes, elapsed);
        let tx_speed =
            rate_bits_per_second(cur.transmit_bytes, prev.counters.transmit_bytes, elapsed);

        let sink = self.sink.as_ref();
        sink.set(Family::Speed, name, Direction::Receive, rx_speed);
        sink.set(Family::Speed, name, Direction::Transmit, tx_speed);

        sink.set(Family::Errors, name, Direction::Receive, cur.receive_errs as f64);
        sink.set(Family::Errors, name, Direction::Transmit, cur.transmit_errs as f64);

        sink.set(Family::Drops, name, Direction::Receive, cur.receive_drop as f64);
        sink.set(Family::Drops, name, Direction::Transmit, cur.transmit_drop as f64);

        sink.set(Family::Packets, name, Direction::Receive, cur.receive_packets as f64);
        sink.set(Family::Packets, name, Direction::Transmit, cur.transmit_packets as f64);

        true
    }

    /// Runs one cycle, records its outcome and returns how long to sleep.
    pub fn step(&self) -> Duration {
        let start = Instant::now();
        match self.run_cycle() {
            Ok(report) => {
                let duration = start.elapsed().as_secs_f64();
                debug!(
                    "Sampling cycle: {} seen, {} filtered, {} published, {} tracked in {:.3}ms",
                    report.seen,
                    report.filtered,
                    report.published,
                    report.tracked,
                    duration * 1000.0
                );
                if let Some(stats) = &self.health_stats {
                    stats.record_cycle(&report, duration);
                }
                if let Some(telemetry) = &self.telemetry {
                    telemetry.sample_duration.set(duration);
                    telemetry.tracked_interfaces.set(report.tracked as f64);
                }
                self.config.interval
            }
            Err(e) => {
                warn!("{}, retrying in {:?}", e, self.config.retry_backoff);
                if let Some(stats) = &self.health_stats {
                    stats.record_cycle_failure();
                }
                if let Some(telemetry) = &self.telemetry {
                    telemetry.source_errors.inc();
                }
                self.config.retry_backoff
            }
        }
    }

    /// Samples forever on the calling thread.
    pub fn run(self) {
        info!(
            "Sampler started: interval={:?}, stale_after={:?}, max_interfaces={}",
            self.config.interval, self.config.stale_after, self.config.max_interfaces
        );
        loop {
            let pause = self.step();
            thread::sleep(pause);
        }
    }

    /// Starts [`Sampler::run`] on a dedicated `sampler` thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("sampler".into())
            .spawn(move || self.run())
    }
}
