//! Interface metadata lookups.
//!
//! The sampler asks an [`InterfaceResolver`] for operational flags (to drop
//! loopback and down interfaces) and for the free-text alias published on the
//! info gauge. [`SysfsResolver`] answers both from /sys/class/net.

use nix::net::if_::InterfaceFlags;
use std::fs;
use std::path::PathBuf;

/// Default sysfs directory holding one entry per interface.
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// Description published when an interface has no readable alias.
pub const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// Operational state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub up: bool,
    pub loopback: bool,
}

impl InterfaceInfo {
    /// Whether the interface should be sampled this cycle.
    pub fn is_sampled(&self) -> bool {
        self.up && !self.loopback
    }
}

impl From<InterfaceFlags> for InterfaceInfo {
    fn from(flags: InterfaceFlags) -> Self {
        Self {
            up: flags.contains(InterfaceFlags::IFF_UP),
            loopback: flags.contains(InterfaceFlags::IFF_LOOPBACK),
        }
    }
}

/// Source of per-interface metadata.
pub trait InterfaceResolver: Send + Sync {
    /// Returns the interface flags, or `None` if they cannot be resolved.
    fn info(&self, name: &str) -> Option<InterfaceInfo>;

    /// Returns the interface alias, or `None` if it is unavailable.
    fn description(&self, name: &str) -> Option<String>;
}

/// Resolver reading `flags` and `ifalias` below a sysfs net directory.
#[derive(Debug, Clone)]
pub struct SysfsResolver {
    root: PathBuf,
}

impl SysfsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn interface_dir(&self, name: &str) -> Option<PathBuf> {
        // Interface names never contain a path separator; refuse anything
        // that would escape the sysfs directory.
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return None;
        }
        Some(self.root.join(name))
    }
}

impl Default for SysfsResolver {
    fn default() -> Self {
        Self::new(SYS_CLASS_NET)
    }
}

impl InterfaceResolver for SysfsResolver {
    fn info(&self, name: &str) -> Option<InterfaceInfo> {
        let path = self.interface_dir(name)?.join("flags");
        let content = fs::read_to_string(path).ok()?;
        parse_flags(&content).map(InterfaceInfo::from)
    }

    fn description(&self, name: &str) -> Option<String> {
        let path = self.interface_dir(name)?.join("ifalias");
        fs::read_to_string(path).ok().map(|s| s.trim().to_string())
    }
}

/// Parses the hexadecimal content of a sysfs `flags` file, e.g. `0x1003`.
pub fn parse_flags(content: &str) -> Option<InterfaceFlags> {
    let trimmed = content.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bits = u32::from_str_radix(hex, 16).ok()?;
    Some(InterfaceFlags::from_bits_truncate(bits as nix::libc::c_int))
}

/// Description to publish for `name`, falling back to [`UNKNOWN_DESCRIPTION`].
pub fn description_or_default(resolver: &dyn InterfaceResolver, name: &str) -> String {
    resolver
        .description(name)
        .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sysfs_with(entries: &[(&str, &str, Option<&str>)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, flags, alias) in entries {
            let iface = dir.path().join(name);
            fs::create_dir_all(&iface).unwrap();
            fs::write(iface.join("flags"), format!("{flags}\n")).unwrap();
            if let Some(alias) = alias {
                fs::write(iface.join("ifalias"), format!("{alias}\n")).unwrap();
            }
        }
        dir
    }

    #[test]
    fn test_parse_flags_up_and_loopback() {
        let lo = InterfaceInfo::from(parse_flags("0x9").unwrap());
        assert!(lo.up);
        assert!(lo.loopback);
        assert!(!lo.is_sampled());

        let eth = InterfaceInfo::from(parse_flags("0x1003\n").unwrap());
        assert!(eth.up);
        assert!(!eth.loopback);
        assert!(eth.is_sampled());

        let down = InterfaceInfo::from(parse_flags("0x1002").unwrap());
        assert!(!down.up);
        assert!(!down.is_sampled());
    }

    #[test]
    fn test_parse_flags_rejects_garbage() {
        assert!(parse_flags("up").is_none());
        assert!(parse_flags("").is_none());
    }

    #[test]
    fn test_sysfs_resolver_reads_flags_and_alias() {
        let dir = sysfs_with(&[
            ("eth0", "0x1003", Some("uplink to core")),
            ("lo", "0x9", None),
        ]);
        let resolver = SysfsResolver::new(dir.path());

        assert!(resolver.info("eth0").unwrap().is_sampled());
        assert!(resolver.info("lo").unwrap().loopback);
        assert!(resolver.info("missing").is_none());

        assert_eq!(resolver.description("eth0").as_deref(), Some("uplink to core"));
        assert_eq!(description_or_default(&resolver, "lo"), UNKNOWN_DESCRIPTION);
    }

    #[test]
    fn test_empty_alias_is_kept_empty() {
        let dir = sysfs_with(&[("eth1", "0x1003", Some(""))]);
        let resolver = SysfsResolver::new(dir.path());
        assert_eq!(description_or_default(&resolver, "eth1"), "");
    }

    #[test]
    fn test_sysfs_resolver_rejects_path_escape() {
        let resolver = SysfsResolver::new("/sys/class/net");
        assert!(resolver.info("../../etc").is_none());
        assert!(resolver.description("..").is_none());
    }
}
