//! Network interface counter source.
//!
//! This module reads cumulative interface counters from /proc/net/dev and
//! hands them to the sampler as one snapshot per cycle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::sampler::{CounterSource, SamplerError};

/// Default location of the kernel counter feed.
pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// Number of counter columns following the interface name.
const NETDEV_COLUMNS: usize = 16;

/// Cumulative counters of one interface as reported by the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetDevStats {
    pub receive_bytes: u64,
    pub receive_packets: u64,
    pub receive_errs: u64,
    pub receive_drop: u64,
    pub transmit_bytes: u64,
    pub transmit_packets: u64,
    pub transmit_errs: u64,
    pub transmit_drop: u64,
}

/// Parses the content of /proc/net/dev.
///
/// Returns `(interface, counters)` pairs in file order. The two header lines
/// are skipped, as are lines without a `:` separator or with fewer than 16
/// counter columns. Individual columns that fail to parse read as zero.
pub fn parse_netdev(content: &str) -> Vec<(String, NetDevStats)> {
    let mut stats = Vec::new();

    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };

        let interface = name.trim();
        if interface.is_empty() {
            continue;
        }

        let values: Vec<&str> = rest.split_whitespace().collect();
        if values.len() < NETDEV_COLUMNS {
            continue; // Skip malformed lines
        }

        let net_stat = NetDevStats {
            receive_bytes: values[0].parse().unwrap_or(0),
            receive_packets: values[1].parse().unwrap_or(0),
            receive_errs: values[2].parse().unwrap_or(0),
            receive_drop: values[3].parse().unwrap_or(0),
            transmit_bytes: values[8].parse().unwrap_or(0),
            transmit_packets: values[9].parse().unwrap_or(0),
            transmit_errs: values[10].parse().unwrap_or(0),
            transmit_drop: values[11].parse().unwrap_or(0),
        };

        stats.push((interface.to_string(), net_stat));
    }

    stats
}

type PendingRead = mpsc::Receiver<io::Result<String>>;

/// Counter source backed by a /proc/net/dev style file.
///
/// At most one read is in flight. A read that outlives `read_timeout` is
/// parked, and later calls report [`SamplerError::SourceStalled`] without
/// starting another reader until it returns.
#[derive(Debug)]
pub struct ProcNetDev {
    path: PathBuf,
    read_timeout: Duration,
    pending: Mutex<Option<PendingRead>>,
}

impl ProcNetDev {
    pub fn new(path: impl Into<PathBuf>, read_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            read_timeout,
            pending: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a stalled read from an earlier call is still blocked.
    pub fn read_pending(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        Self::settle(&mut pending)
    }

    /// Drops a parked read once it has finished. Returns true while it is
    /// still blocked. A late result is discarded since its timestamp is
    /// unknown.
    fn settle(pending: &mut Option<PendingRead>) -> bool {
        let Some(rx) = pending.as_ref() else {
            return false;
        };
        match rx.try_recv() {
            Err(TryRecvError::Empty) => true,
            Ok(_) | Err(TryRecvError::Disconnected) => {
                *pending = None;
                false
            }
        }
    }

    fn stalled(&self) -> SamplerError {
        SamplerError::SourceStalled {
            path: self.path.clone(),
            timeout: self.read_timeout,
        }
    }
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::new(PROC_NET_DEV, Duration::from_secs(2))
    }
}

impl CounterSource for ProcNetDev {
    fn read_snapshot(&self) -> Result<Vec<(String, NetDevStats)>, SamplerError> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if Self::settle(&mut pending) {
            return Err(self.stalled());
        }

        // The read runs on a helper thread so a wedged filesystem cannot hold
        // up the sampling loop past `read_timeout`.
        let (tx, rx) = mpsc::channel();
        let path = self.path.clone();
        thread::Builder::new()
            .name("netdev-read".into())
            .spawn(move || {
                let _ = tx.send(fs::read_to_string(&path));
            })
            .map_err(|source| SamplerError::SourceUnavailable {
                path: self.path.clone(),
                source,
            })?;

        match rx.recv_timeout(self.read_timeout) {
            Ok(Ok(content)) => Ok(parse_netdev(&content)),
            Ok(Err(source)) => Err(SamplerError::SourceUnavailable {
                path: self.path.clone(),
                source,
            }),
            Err(RecvTimeoutError::Timeout) => {
                *pending = Some(rx);
                Err(self.stalled())
            }
            Err(RecvTimeoutError::Disconnected) => Err(self.stalled()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;
    use std::io::Write;
    use std::time::Instant;
    use tempfile::{NamedTempFile, TempDir};

    const SAMPLE: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 9876543    1234    0    0    0     0          0         0  9876543    1234    0    0    0     0       0          0
  eth0: 1000 10 1 2 0 0 0 0 500 5 3 4 0 0 0 0
 wlan0:2000 20 0 0 0 0 0 0 1500 15 0 0 0 0 0 0
bogus: 1 2 3
";

    #[test]
    fn test_parse_netdev_reads_columns() {
        let stats = parse_netdev(SAMPLE);
        let names: Vec<&str> = stats.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["lo", "eth0", "wlan0"]);

        let eth0 = stats[1].1;
        assert_eq!(eth0.receive_bytes, 1000);
        assert_eq!(eth0.receive_packets, 10);
        assert_eq!(eth0.receive_errs, 1);
        assert_eq!(eth0.receive_drop, 2);
        assert_eq!(eth0.transmit_bytes, 500);
        assert_eq!(eth0.transmit_packets, 5);
        assert_eq!(eth0.transmit_errs, 3);
        assert_eq!(eth0.transmit_drop, 4);
    }

    #[test]
    fn test_parse_netdev_name_glued_to_counters() {
        let stats = parse_netdev(SAMPLE);
        let wlan0 = stats.iter().find(|(n, _)| n == "wlan0").unwrap().1;
        assert_eq!(wlan0.receive_bytes, 2000);
        assert_eq!(wlan0.transmit_bytes, 1500);
    }

    #[test]
    fn test_parse_netdev_skips_short_lines() {
        let stats = parse_netdev(SAMPLE);
        assert!(stats.iter().all(|(n, _)| n != "bogus"));
    }

    #[test]
    fn test_parse_netdev_bad_number_reads_zero() {
        let content = "h1\nh2\neth0: x 10 0 0 0 0 0 0 500 5 0 0 0 0 0 0\n";
        let stats = parse_netdev(content);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].1.receive_bytes, 0);
        assert_eq!(stats[0].1.receive_packets, 10);
    }

    #[test]
    fn test_proc_net_dev_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = ProcNetDev::new(file.path(), Duration::from_secs(2));
        let stats = source.read_snapshot().unwrap();
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_proc_net_dev_missing_file_is_unavailable() {
        let source = ProcNetDev::new("/nonexistent/net/dev", Duration::from_secs(2));
        let err = source.read_snapshot().unwrap_err();
        assert!(matches!(err, SamplerError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_stalled_read_keeps_one_reader() {
        let dir = TempDir::new().unwrap();
        let fifo = dir.path().join("dev");
        mkfifo(&fifo, Mode::S_IRUSR | Mode::S_IWUSR).unwrap();

        // No writer: the first read blocks in open() and times out.
        let source = ProcNetDev::new(&fifo, Duration::from_millis(20));
        let err = source.read_snapshot().unwrap_err();
        assert!(matches!(err, SamplerError::SourceStalled { .. }));
        assert!(source.read_pending());

        // Later calls fail fast instead of stacking up more readers, so 50
        // of them finish well inside 50 timeouts.
        let start = Instant::now();
        for _ in 0..50 {
            let err = source.read_snapshot().unwrap_err();
            assert!(matches!(err, SamplerError::SourceStalled { .. }));
        }
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(source.read_pending());

        // Unblock the parked reader; the source becomes usable again.
        fs::write(&fifo, SAMPLE).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.read_pending() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!source.read_pending());
    }
}
