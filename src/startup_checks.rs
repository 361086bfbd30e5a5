//! Startup requirement validation for herakles-netspeed-exporter.
//!
//! This module checks that the counter feed and the sysfs interface
//! directory are readable before the sampler starts.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use herakles_netspeed_exporter::netdev::parse_netdev;

/// Validate all runtime requirements
pub fn validate_requirements(
    proc_net_dev: &Path,
    sys_class_net: &Path,
) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_counter_source(proc_net_dev)?;
    check_sysfs(sys_class_net)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Reading interface counters needs no privileges; just note who we are.
fn check_user_privileges() {
    if geteuid().is_root() {
        warn!("⚠️  Running as root - an unprivileged user is sufficient for this exporter");
    } else {
        debug!("Running as uid={}", geteuid());
    }
}

/// Check that the counter feed is readable and has at least one interface.
fn check_counter_source(path: &Path) -> Result<(), ValidationError> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let count = parse_netdev(&content).len();
            if count == 0 {
                warn!("⚠️  {} contains no interfaces", path.display());
            } else {
                info!("✅ {}: {} interfaces", path.display(), count);
            }
            Ok(())
        }
        Err(e) => {
            error!("❌ Cannot read {}: {}", path.display(), e);
            Err(ValidationError::CounterSourceUnreadable(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
    }
}

/// Check that interface flags can be looked up.
fn check_sysfs(path: &Path) -> Result<(), ValidationError> {
    if !path.is_dir() {
        error!("❌ {} not found - is sysfs mounted?", path.display());
        return Err(ValidationError::SysfsMissing(path.display().to_string()));
    }

    let readable = fs::read_dir(path)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().join("flags").exists())
                .count()
        })
        .unwrap_or(0);
    if readable == 0 {
        warn!(
            "⚠️  No interface flags found below {} - every interface will be skipped",
            path.display()
        );
    } else {
        info!("✅ {}: flags for {} interfaces", path.display(), readable);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Counter source unreadable: {0}")]
    CounterSourceUnreadable(String),

    #[error("Interface directory not found: {0}")]
    SysfsMissing(String),
}
