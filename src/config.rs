//! Configuration management for herakles-netspeed-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use herakles_netspeed_exporter::{IpAllowlist, SamplerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_STALE_AFTER_SECS: u64 = 300;
pub const DEFAULT_MAX_INTERFACES: usize = 1000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_PROC_NET_DEV: &str = "/proc/net/dev";
pub const DEFAULT_SYS_CLASS_NET: &str = "/sys/class/net";

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,
    #[serde(alias = "allowed-ips")]
    pub allowed_ips: Option<Vec<String>>,

    // Sampling
    #[serde(alias = "sample-interval-ms")]
    pub sample_interval_ms: Option<u64>,
    #[serde(alias = "retry-backoff-ms")]
    pub retry_backoff_ms: Option<u64>,
    #[serde(alias = "read-timeout-ms")]
    pub read_timeout_ms: Option<u64>,
    #[serde(alias = "stale-after-secs")]
    pub stale_after_secs: Option<u64>,
    #[serde(alias = "max-interfaces")]
    pub max_interfaces: Option<usize>,

    // Sources
    #[serde(alias = "proc-net-dev")]
    pub proc_net_dev: Option<PathBuf>,
    #[serde(alias = "sys-class-net")]
    pub sys_class_net: Option<PathBuf>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            allowed_ips: Some(Vec::new()),
            sample_interval_ms: Some(DEFAULT_SAMPLE_INTERVAL_MS),
            retry_backoff_ms: Some(DEFAULT_RETRY_BACKOFF_MS),
            read_timeout_ms: Some(DEFAULT_READ_TIMEOUT_MS),
            stale_after_secs: Some(DEFAULT_STALE_AFTER_SECS),
            max_interfaces: Some(DEFAULT_MAX_INTERFACES),
            proc_net_dev: Some(PathBuf::from(DEFAULT_PROC_NET_DEV)),
            sys_class_net: Some(PathBuf::from(DEFAULT_SYS_CLASS_NET)),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    /// Sampler timing and bounds with defaults filled in.
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval: Duration::from_millis(
                self.sample_interval_ms.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS),
            ),
            retry_backoff: Duration::from_millis(
                self.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
            stale_after: Duration::from_secs(
                self.stale_after_secs.unwrap_or(DEFAULT_STALE_AFTER_SECS),
            ),
            max_interfaces: self.max_interfaces.unwrap_or(DEFAULT_MAX_INTERFACES),
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS))
    }

    pub fn proc_net_dev_path(&self) -> PathBuf {
        self.proc_net_dev
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_NET_DEV))
    }

    pub fn sys_class_net_path(&self) -> PathBuf {
        self.sys_class_net
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SYS_CLASS_NET))
    }

    pub fn allowlist(&self) -> IpAllowlist {
        IpAllowlist::new(self.allowed_ips.iter().flatten())
    }

    /// Effective log level; unset means info.
    pub fn log_level(&self) -> Result<LogLevel, String> {
        match self.log_level.as_deref() {
            None => Ok(LogLevel::Info),
            Some(level) => LogLevel::from_str(level.trim(), true)
                .map_err(|_| format!("Invalid log_level '{}'", level)),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.sample_interval_ms == Some(0) {
        return Err("sample_interval_ms must be greater than 0".into());
    }
    if cfg.read_timeout_ms == Some(0) {
        return Err("read_timeout_ms must be greater than 0".into());
    }
    if cfg.stale_after_secs == Some(0) {
        return Err("stale_after_secs must be greater than 0".into());
    }
    if cfg.max_interfaces == Some(0) {
        return Err("max_interfaces must be greater than 0".into());
    }

    if let Some(ips) = &cfg.allowed_ips {
        if ips.iter().any(|ip| ip.trim().is_empty()) {
            return Err("allowed_ips must not contain empty entries".into());
        }
    }

    cfg.log_level()?;

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Err(format!("TLS {} file not found: {}", what, path).into());
    }
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
        Ok(_) => Ok(()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI/env (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    if let Some(list) = &args.allowed_ips {
        config.allowed_ips = Some(IpAllowlist::parse(list).entries().to_vec());
    }

    if let Some(ms) = args.sample_interval_ms {
        config.sample_interval_ms = Some(ms);
    }
    if let Some(secs) = args.stale_after_secs {
        config.stale_after_secs = Some(secs);
    }
    if let Some(n) = args.max_interfaces {
        config.max_interfaces = Some(n);
    }
    if let Some(path) = &args.proc_net_dev {
        config.proc_net_dev = Some(path.clone());
    }
    if let Some(path) = &args.sys_class_net {
        config.sys_class_net = Some(path.clone());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads a config file, or the first one found in the default locations.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/herakles/netspeed-exporter.yaml",
                "/etc/herakles/netspeed-exporter.yml",
                "/etc/herakles/netspeed-exporter.json",
                "./herakles-netspeed-exporter.yaml",
                "./herakles-netspeed-exporter.yml",
                "./herakles-netspeed-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config text; the extension picks the format, YAML by default.
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}
