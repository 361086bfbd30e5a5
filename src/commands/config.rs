//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-netspeed-exporter.yaml"),
    };

    let is_yaml = matches!(format, ConfigFormat::Yaml);
    let mut content = render_config(&config, format)?;
    if commented && is_yaml {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Netspeed Exporter Configuration
# =========================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port (env: PORT)
# allowed_ips: []              # Client IPs allowed to scrape, empty = all (env: ALLOWED_IPS)
#
# Sampling
# --------
# sample_interval_ms: 1000     # Time between sampling cycles
# retry_backoff_ms: 1000       # Wait after the counter source could not be read
# read_timeout_ms: 2000        # Give up on a single counter read after this long
# stale_after_secs: 300        # Forget interfaces not seen for this long
# max_interfaces: 1000         # Upper bound on tracked interfaces
#
# Sources
# -------
# proc_net_dev: /proc/net/dev      # Interface counter feed
# sys_class_net: /sys/class/net    # Interface flags and aliases
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable netspeed_exporter_* metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
