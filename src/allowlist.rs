//! Static IP allowlist for the HTTP endpoints.
//!
//! Matching is an exact string comparison between a configured entry and the
//! host part of the caller's address. An empty allowlist admits everyone.

use std::net::SocketAddr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAllowlist {
    entries: Vec<String>,
}

impl IpAllowlist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list such as `10.0.0.1, 10.0.0.2`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Checks a remote address given as `ip`, `ip:port` or `[ipv6]:port`.
    pub fn is_allowed(&self, remote: &str) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let host = host_part(remote);
        self.entries.iter().any(|allowed| allowed == host)
    }

    /// Checks a peer socket address.
    pub fn is_allowed_addr(&self, remote: &SocketAddr) -> bool {
        self.is_allowed(&remote.ip().to_string())
    }
}

/// Strips an optional port (and IPv6 brackets) from a remote address.
fn host_part(remote: &str) -> &str {
    if let Some(rest) = remote.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host;
        }
    }
    match remote.rsplit_once(':') {
        // A single colon separates host and port; more than one means a bare IPv6 address.
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host,
        _ => remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allowlist_allows_all() {
        let list = IpAllowlist::parse("");
        assert!(list.is_empty());
        assert!(list.is_allowed("10.0.0.2"));
        assert!(list.is_allowed("192.168.1.1:5555"));
    }

    #[test]
    fn test_exact_match_with_and_without_port() {
        let list = IpAllowlist::parse("10.0.0.1");
        assert!(list.is_allowed("10.0.0.1"));
        assert!(list.is_allowed("10.0.0.1:43210"));
        assert!(!list.is_allowed("10.0.0.2"));
        assert!(!list.is_allowed("10.0.0.2:43210"));
    }

    #[test]
    fn test_parse_trims_entries() {
        let list = IpAllowlist::parse(" 10.0.0.1 , ,10.0.0.3");
        assert_eq!(list.entries(), &["10.0.0.1".to_string(), "10.0.0.3".to_string()]);
        assert!(list.is_allowed("10.0.0.3:80"));
    }

    #[test]
    fn test_ipv6_addresses() {
        let list = IpAllowlist::new(["::1"]);
        assert!(list.is_allowed("::1"));
        assert!(list.is_allowed("[::1]:9216"));
        assert!(!list.is_allowed("[::2]:9216"));
    }

    #[test]
    fn test_socket_addr() {
        let list = IpAllowlist::parse("127.0.0.1");
        let ok: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let denied: SocketAddr = "127.0.0.2:40000".parse().unwrap();
        assert!(list.is_allowed_addr(&ok));
        assert!(!list.is_allowed_addr(&denied));
    }
}
