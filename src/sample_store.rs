//! Bounded store of the last cumulative counters seen per interface.
//!
//! The sampler is the only writer. Readers (health reporting, tests) may call
//! [`SampleStore::get`] and [`SampleStore::len`] at any time; all access goes
//! through a single `RwLock` guarding the whole map.

use ahash::AHashMap as HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::netdev::NetDevStats;

/// Default maximum number of tracked interfaces.
pub const DEFAULT_MAX_INTERFACES: usize = 1000;

/// Default idle time after which an interface is forgotten.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Last observed counters for one interface.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSample {
    pub name: String,
    pub counters: NetDevStats,
    /// When the counters were read. Rates are computed against this.
    pub sampled_at: Instant,
    /// When the interface was last present in a scan. Drives eviction.
    pub last_seen: Instant,
}

impl InterfaceSample {
    pub fn new(name: impl Into<String>, counters: NetDevStats, sampled_at: Instant) -> Self {
        Self {
            name: name.into(),
            counters,
            sampled_at,
            last_seen: sampled_at,
        }
    }
}

/// Map of interface name to its most recent sample, with age and size bounds.
#[derive(Default)]
pub struct SampleStore {
    inner: RwLock<HashMap<String, InterfaceSample>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stored sample for `name`, if any.
    pub fn get(&self, name: &str) -> Option<InterfaceSample> {
        match self.inner.read() {
            Ok(map) => map.get(name).cloned(),
            Err(poisoned) => poisoned.into_inner().get(name).cloned(),
        }
    }

    /// Inserts or replaces the sample for `name`, stamping `last_seen` with `seen_at`.
    pub fn put(&self, name: &str, mut sample: InterfaceSample, seen_at: Instant) {
        sample.last_seen = seen_at;
        if sample.name != name {
            sample.name = name.to_string();
        }
        let mut map = match self.inner.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert(name.to_string(), sample);
    }

    /// Removes every entry not seen within `max_age` of `now`.
    ///
    /// Returns the number of evicted entries.
    pub fn evict_stale(&self, now: Instant, max_age: Duration) -> usize {
        let mut map = match self.inner.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = map.len();
        map.retain(|_, s| now.saturating_duration_since(s.last_seen) <= max_age);
        before - map.len()
    }

    /// Shrinks the store to at most `max_size` entries, dropping the oldest
    /// `last_seen` first. Equal `last_seen` values are ordered by name, so the
    /// lexicographically smaller name goes first.
    ///
    /// Returns the names that were evicted, in eviction order.
    pub fn enforce_capacity(&self, max_size: usize) -> Vec<String> {
        let mut map = match self.inner.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        if map.len() <= max_size {
            return Vec::new();
        }

        let mut by_age: Vec<(Instant, String)> = map
            .values()
            .map(|s| (s.last_seen, s.name.clone()))
            .collect();
        by_age.sort();

        let excess = map.len() - max_size;
        let evicted: Vec<String> = by_age.into_iter().take(excess).map(|(_, n)| n).collect();
        for name in &evicted {
            map.remove(name);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of tracked interface names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.inner.read() {
            Ok(map) => map.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(rx: u64, tx: u64) -> NetDevStats {
        NetDevStats {
            receive_bytes: rx,
            transmit_bytes: tx,
            ..Default::default()
        }
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = SampleStore::new();
        assert!(store.get("eth0").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        store.put("eth0", InterfaceSample::new("eth0", counters(10, 20), t0), t0);

        let got = store.get("eth0").unwrap();
        assert_eq!(got.counters.receive_bytes, 10);
        assert_eq!(got.counters.transmit_bytes, 20);
        assert_eq!(got.last_seen, t0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_replaces_and_refreshes_last_seen() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        store.put("eth0", InterfaceSample::new("eth0", counters(1, 1), t0), t0);
        store.put("eth0", InterfaceSample::new("eth0", counters(2, 2), t1), t1);

        let got = store.get("eth0").unwrap();
        assert_eq!(got.counters.receive_bytes, 2);
        assert_eq!(got.sampled_at, t1);
        assert_eq!(got.last_seen, t1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_identical_twice_is_idempotent() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        let sample = InterfaceSample::new("eth0", counters(5, 6), t0);
        store.put("eth0", sample.clone(), t0);
        store.put("eth0", sample.clone(), t0);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("eth0").unwrap(), sample);
    }

    #[test]
    fn test_evict_stale_removes_old_entries_only() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        let now = t0 + Duration::from_secs(400);
        store.put("old", InterfaceSample::new("old", counters(0, 0), t0), t0);
        store.put("fresh", InterfaceSample::new("fresh", counters(0, 0), now), now);

        let removed = store.evict_stale(now, DEFAULT_STALE_AFTER);

        assert_eq!(removed, 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_evict_stale_keeps_entry_exactly_at_window() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        store.put("eth0", InterfaceSample::new("eth0", counters(0, 0), t0), t0);

        let removed = store.evict_stale(t0 + DEFAULT_STALE_AFTER, DEFAULT_STALE_AFTER);
        assert_eq!(removed, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_enforce_capacity_drops_oldest() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        for i in 0..5u64 {
            let seen = t0 + Duration::from_secs(i);
            let name = format!("veth{i}");
            store.put(&name, InterfaceSample::new(&name, counters(i, i), seen), seen);
        }

        let evicted = store.enforce_capacity(3);

        assert_eq!(evicted, vec!["veth0".to_string(), "veth1".to_string()]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.names(), vec!["veth2", "veth3", "veth4"]);
    }

    #[test]
    fn test_enforce_capacity_ties_broken_by_name() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        for name in ["c", "a", "b"] {
            store.put(name, InterfaceSample::new(name, counters(0, 0), t0), t0);
        }

        let evicted = store.enforce_capacity(1);

        assert_eq!(evicted, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.names(), vec!["c"]);
    }

    #[test]
    fn test_enforce_capacity_under_limit_is_noop() {
        let store = SampleStore::new();
        let t0 = Instant::now();
        store.put("eth0", InterfaceSample::new("eth0", counters(0, 0), t0), t0);

        assert!(store.enforce_capacity(DEFAULT_MAX_INTERFACES).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_see_bounded_consistent_store() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        const CAP: usize = 8;
        let store = Arc::new(SampleStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut reads = 0u64;
                    loop {
                        let finished = done.load(Ordering::Acquire);
                        assert!(store.len() <= CAP);
                        for i in 0..32 {
                            let name = format!("veth{i}");
                            if let Some(sample) = store.get(&name) {
                                assert_eq!(sample.name, name);
                                assert_eq!(sample.counters.receive_bytes, sample.counters.transmit_bytes);
                            }
                        }
                        reads += 1;
                        if finished {
                            break reads;
                        }
                    }
                })
            })
            .collect();

        let t0 = Instant::now();
        for round in 0..2000u64 {
            let name = format!("veth{}", round % 32);
            let now = t0 + Duration::from_millis(round);
            // Room is made before the insert, so the store never holds more than CAP.
            store.enforce_capacity(CAP - 1);
            store.put(&name, InterfaceSample::new(&name, counters(round, round), now), now);
            store.evict_stale(now, Duration::from_millis(20));
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
        assert!(store.len() <= CAP);
    }
}
