//! Health statistics for the exporter.
//!
//! This module tracks how the sampling loop and the HTTP endpoints behave:
//! cycle durations, interface counts, source failures, and scrape traffic.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};

use crate::sampler::CycleReport;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(last, avg, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only last 10 minutes of timestamps to avoid unbounded growth
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > Duration::from_secs(600))
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            let now = Instant::now();
            guard
                .iter()
                .filter(|&&t| now.duration_since(t) <= Duration::from_secs(60))
                .count() as u64
        } else {
            0
        }
    }
}

/// Sampling and HTTP statistics shared between the sampler thread and handlers.
pub struct HealthStats {
    // Sampling
    pub cycle_duration_seconds: Stat,
    pub interfaces_seen: Stat,
    pub interfaces_tracked: Stat,
    pub cycle_success_count: AtomicU64,
    pub cycle_failure_count: AtomicU64,
    pub evicted_interfaces: AtomicU64,

    // HTTP server stats
    pub http_request_timestamps: RequestTimestamps,
    pub scrape_duration_ms: Stat,
    pub metrics_endpoint_calls: AtomicU64,
    pub denied_requests: AtomicU64,

    // Timing
    pub start_time: Instant,
    pub last_cycle_time: StdRwLock<Option<Instant>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            cycle_duration_seconds: Stat::default(),
            interfaces_seen: Stat::default(),
            interfaces_tracked: Stat::default(),
            cycle_success_count: AtomicU64::new(0),
            cycle_failure_count: AtomicU64::new(0),
            evicted_interfaces: AtomicU64::new(0),
            http_request_timestamps: RequestTimestamps::default(),
            scrape_duration_ms: Stat::default(),
            metrics_endpoint_calls: AtomicU64::new(0),
            denied_requests: AtomicU64::new(0),
            start_time: Instant::now(),
            last_cycle_time: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a completed sampling cycle.
    pub fn record_cycle(&self, report: &CycleReport, duration_seconds: f64) {
        self.cycle_duration_seconds.add_sample(duration_seconds);
        self.interfaces_seen.add_sample(report.seen as f64);
        self.interfaces_tracked.add_sample(report.tracked as f64);
        self.evicted_interfaces.fetch_add(
            (report.evicted_stale + report.evicted_capacity) as u64,
            Ordering::Relaxed,
        );
        self.cycle_success_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_cycle_time.write() {
            *guard = Some(Instant::now());
        }
    }

    pub fn record_cycle_failure(&self) {
        self.cycle_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_denied_request(&self) {
        self.denied_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_metrics_endpoint_call(&self) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scrape_duration_ms(&self, duration_ms: f64) {
        self.scrape_duration_ms.add_sample(duration_ms);
    }

    pub fn get_cycle_success_rate(&self) -> f64 {
        let success = self.cycle_success_count.load(Ordering::Relaxed);
        let failure = self.cycle_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    /// Time since the last successful cycle, if any.
    pub fn since_last_cycle(&self) -> Option<Duration> {
        self.last_cycle_time
            .read()
            .ok()
            .and_then(|guard| guard.map(|t| t.elapsed()))
    }

    /// True when a cycle has succeeded within `max_age`.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.since_last_cycle().is_some_and(|age| age <= max_age)
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let left_col = 26usize;
        let col_w = 12usize;

        let row = |out: &mut String, label: &str, stat: &Stat, precision: usize| {
            let (cur, avg, max, min, _) = stat.snapshot();
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{:.p$}", cur, p = precision),
                format!("{:.p$}", avg, p = precision.max(1)),
                format!("{:.p$}", max, p = precision),
                format!("{:.p$}", min, p = precision),
                left = left_col,
                col = col_w
            )
            .ok();
        };

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out, "{}", "-".repeat(left_col + 4 * (col_w + 3))).ok();

        writeln!(out).ok();
        writeln!(out, "SAMPLING").ok();
        writeln!(out, "--------").ok();
        row(&mut out, "cycle_duration (s)", &self.cycle_duration_seconds, 3);
        row(&mut out, "interfaces_seen", &self.interfaces_seen, 0);
        row(&mut out, "interfaces_tracked", &self.interfaces_tracked, 0);

        writeln!(out).ok();
        writeln!(out, "HTTP").ok();
        writeln!(out, "----").ok();
        row(&mut out, "scrape_duration (ms)", &self.scrape_duration_ms, 2);

        writeln!(out).ok();
        writeln!(out, "COUNTERS").ok();
        writeln!(out, "--------").ok();
        let last_cycle = self
            .since_last_cycle()
            .map(|d| format!("{:.1}s ago", d.as_secs_f64()))
            .unwrap_or_else(|| "N/A".to_string());
        let counters = [
            (
                "cycles_ok",
                self.cycle_success_count.load(Ordering::Relaxed).to_string(),
            ),
            (
                "cycles_failed",
                self.cycle_failure_count.load(Ordering::Relaxed).to_string(),
            ),
            (
                "cycle_success_rate (%)",
                format!("{:.1}", self.get_cycle_success_rate()),
            ),
            (
                "evicted_interfaces",
                self.evicted_interfaces.load(Ordering::Relaxed).to_string(),
            ),
            (
                "metrics_endpoint_calls",
                self.metrics_endpoint_calls.load(Ordering::Relaxed).to_string(),
            ),
            (
                "denied_requests",
                self.denied_requests.load(Ordering::Relaxed).to_string(),
            ),
            (
                "http_requests_last_minute",
                self.http_request_timestamps.count_last_minute().to_string(),
            ),
            ("last_cycle", last_cycle),
        ];
        for (label, value) in counters {
            writeln!(out, "{:left$} | {}", label, value, left = left_col).ok();
        }

        out
    }
}
