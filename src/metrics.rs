//! Prometheus metric definitions for herakles-netspeed-exporter.
//!
//! The sampler only ever writes gauge values through the [`GaugeSink`] trait.
//! [`NetworkMetrics`] is the production sink; it owns the five interface gauge
//! families and registers them on a `prometheus::Registry`.

use prometheus::{Counter, Gauge, GaugeVec, Opts, Registry};

/// Traffic direction label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Receive,
    Transmit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Receive => "receive",
            Direction::Transmit => "transmit",
        }
    }
}

/// Gauge families labelled by (interface, direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Throughput in bits per second.
    Speed,
    Errors,
    Drops,
    Packets,
}

/// Write-only destination for published values.
pub trait GaugeSink: Send + Sync {
    fn set(&self, family: Family, interface: &str, direction: Direction, value: f64);

    /// Publishes the info gauge (value 1) for `interface` with its description.
    fn set_info(&self, interface: &str, description: &str);
}

/// The interface gauge families served on /metrics.
#[derive(Clone)]
pub struct NetworkMetrics {
    pub speed_bits: GaugeVec,   // labels: interface, direction
    pub errors: GaugeVec,       // labels: interface, direction
    pub drops: GaugeVec,        // labels: interface, direction
    pub packets: GaugeVec,      // labels: interface, direction
    pub interface_info: GaugeVec, // labels: interface, description
}

impl NetworkMetrics {
    /// Creates and registers all interface metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let speed_bits = GaugeVec::new(
            Opts::new(
                "network_interface_speed_bits",
                "Network interface speed in bits per second",
            ),
            &["interface", "direction"],
        )?;
        let errors = GaugeVec::new(
            Opts::new(
                "network_interface_errors_total",
                "Total number of network interface errors",
            ),
            &["interface", "direction"],
        )?;
        let drops = GaugeVec::new(
            Opts::new(
                "network_interface_drops_total",
                "Total number of network interface drops",
            ),
            &["interface", "direction"],
        )?;
        let packets = GaugeVec::new(
            Opts::new(
                "network_interface_packets_total",
                "Total number of network interface packets",
            ),
            &["interface", "direction"],
        )?;
        let interface_info = GaugeVec::new(
            Opts::new(
                "network_interface_info",
                "Information about network interfaces",
            ),
            &["interface", "description"],
        )?;

        registry.register(Box::new(speed_bits.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(drops.clone()))?;
        registry.register(Box::new(packets.clone()))?;
        registry.register(Box::new(interface_info.clone()))?;

        Ok(Self {
            speed_bits,
            errors,
            drops,
            packets,
            interface_info,
        })
    }

    fn family(&self, family: Family) -> &GaugeVec {
        match family {
            Family::Speed => &self.speed_bits,
            Family::Errors => &self.errors,
            Family::Drops => &self.drops,
            Family::Packets => &self.packets,
        }
    }
}

impl GaugeSink for NetworkMetrics {
    fn set(&self, family: Family, interface: &str, direction: Direction, value: f64) {
        self.family(family)
            .with_label_values(&[interface, direction.as_str()])
            .set(value);
    }

    fn set_info(&self, interface: &str, description: &str) {
        self.interface_info
            .with_label_values(&[interface, description])
            .set(1.0);
    }
}

/// Internal exporter_* telemetry.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub sample_duration: Gauge,
    pub tracked_interfaces: Gauge,
    pub source_errors: Counter,
    pub scrape_duration: Gauge,
}

impl ExporterMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let sample_duration = Gauge::new(
            "netspeed_exporter_sample_duration_seconds",
            "Time spent in the last sampling cycle",
        )?;
        let tracked_interfaces = Gauge::new(
            "netspeed_exporter_tracked_interfaces",
            "Number of interfaces held in the sample store after eviction",
        )?;
        let source_errors = Counter::new(
            "netspeed_exporter_source_errors_total",
            "Number of sampling cycles that could not read the counter source",
        )?;
        let scrape_duration = Gauge::new(
            "netspeed_exporter_scrape_duration_seconds",
            "Time spent serving the last /metrics request",
        )?;

        registry.register(Box::new(sample_duration.clone()))?;
        registry.register(Box::new(tracked_interfaces.clone()))?;
        registry.register(Box::new(source_errors.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;

        Ok(Self {
            sample_duration,
            tracked_interfaces,
            source_errors,
            scrape_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    fn render(registry: &Registry) -> String {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_network_metrics_render_labels() {
        let registry = Registry::new();
        let metrics = NetworkMetrics::new(&registry).unwrap();

        metrics.set(Family::Speed, "eth0", Direction::Receive, 8000.0);
        metrics.set(Family::Drops, "eth0", Direction::Transmit, 4.0);
        metrics.set_info("eth0", "uplink");

        let text = render(&registry);
        assert!(text.contains(
            r#"network_interface_speed_bits{direction="receive",interface="eth0"} 8000"#
        ));
        assert!(text.contains(
            r#"network_interface_drops_total{direction="transmit",interface="eth0"} 4"#
        ));
        assert!(text.contains(r#"network_interface_info{description="uplink",interface="eth0"} 1"#));
    }

    #[test]
    fn test_exporter_metrics_register_alongside() {
        let registry = Registry::new();
        NetworkMetrics::new(&registry).unwrap();
        let telemetry = ExporterMetrics::new(&registry).unwrap();
        telemetry.source_errors.inc();

        let text = render(&registry);
        assert!(text.contains("netspeed_exporter_source_errors_total 1"));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        NetworkMetrics::new(&registry).unwrap();
        assert!(NetworkMetrics::new(&registry).is_err());
    }
}
