//! Bounded-staleness handle cache.
//!
//! Maps a sandbox identifier to its last resolved handle plus an expiry
//! instant. The cache is pure in-memory bookkeeping: it cannot fail and never
//! participates in error propagation. One entry per identifier at any time;
//! `put` replaces, never duplicates.
//!
//! Distinct identifiers can churn without bound, so once the map crosses
//! [`SWEEP_THRESHOLD`] live entries a `put` first drops everything already
//! expired before inserting.

use crate::backend::SandboxHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Entry count above which `put` sweeps expired entries before inserting.
const SWEEP_THRESHOLD: usize = 1024;

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum Freshness {
    /// An entry exists and `now < expires_at`; the stored handle is returned.
    Fresh(SandboxHandle),
    /// An entry exists but its TTL has elapsed.
    Stale,
    /// No entry for this identifier.
    Absent,
}

struct Entry {
    handle: SandboxHandle,
    expires_at: Instant,
}

/// TTL-stamped sandbox handle cache. Explicitly constructed and injectable,
/// so multiple server instances in one process never share state.
pub struct HandleCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl HandleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn lookup(&self, id: &str) -> Freshness {
        self.lookup_at(id, Instant::now())
    }

    fn lookup_at(&self, id: &str, now: Instant) -> Freshness {
        match self.entries.lock().get(id) {
            Some(entry) if now < entry.expires_at => Freshness::Fresh(entry.handle.clone()),
            Some(_) => Freshness::Stale,
            None => Freshness::Absent,
        }
    }

    /// Insert or overwrite the entry for `id`, stamped `now + ttl`.
    pub fn put(&self, id: &str, handle: SandboxHandle) {
        self.put_at(id, handle, Instant::now());
    }

    fn put_at(&self, id: &str, handle: SandboxHandle, now: Instant) {
        let mut entries = self.entries.lock();
        if entries.len() >= SWEEP_THRESHOLD && !entries.contains_key(id) {
            entries.retain(|_, entry| now < entry.expires_at);
        }
        entries.insert(
            id.to_string(),
            Entry {
                handle,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::handle;

    fn cache_with_ttl_ms(ms: u64) -> HandleCache {
        HandleCache::new(Duration::from_millis(ms))
    }

    #[test]
    fn lookup_on_empty_cache_is_absent() {
        let cache = cache_with_ttl_ms(1000);
        assert!(matches!(cache.lookup("sb1"), Freshness::Absent));
    }

    #[test]
    fn entry_is_fresh_within_ttl_and_stale_at_expiry() {
        let cache = cache_with_ttl_ms(1000);
        let t0 = Instant::now();
        cache.put_at("sb1", handle("sb1"), t0);

        // t=0 and t=500: fresh, returning the stored handle
        match cache.lookup_at("sb1", t0) {
            Freshness::Fresh(h) => assert_eq!(h.id, "sb1"),
            other => panic!("expected fresh at t=0, got {other:?}"),
        }
        assert!(matches!(
            cache.lookup_at("sb1", t0 + Duration::from_millis(500)),
            Freshness::Fresh(_)
        ));

        // t=1000 and beyond: stale, not absent (the entry still exists)
        assert!(matches!(
            cache.lookup_at("sb1", t0 + Duration::from_millis(1000)),
            Freshness::Stale
        ));
        assert!(matches!(
            cache.lookup_at("sb1", t0 + Duration::from_millis(5000)),
            Freshness::Stale
        ));
    }

    #[test]
    fn put_replaces_rather_than_duplicates() {
        let cache = cache_with_ttl_ms(1000);
        let t0 = Instant::now();
        cache.put_at("sb1", handle("sb1"), t0);
        // A later put on the same id must win and leave exactly one entry.
        cache.put_at("sb1", handle("sb1"), t0 + Duration::from_millis(800));
        assert_eq!(cache.len(), 1);
        assert!(matches!(
            cache.lookup_at("sb1", t0 + Duration::from_millis(1500)),
            Freshness::Fresh(_)
        ));
    }

    #[test]
    fn entries_for_distinct_ids_are_independent() {
        let cache = cache_with_ttl_ms(1000);
        let t0 = Instant::now();
        cache.put_at("sb1", handle("sb1"), t0);
        cache.put_at("sb2", handle("sb2"), t0 + Duration::from_millis(900));

        let t_late = t0 + Duration::from_millis(1100);
        assert!(matches!(cache.lookup_at("sb1", t_late), Freshness::Stale));
        assert!(matches!(cache.lookup_at("sb2", t_late), Freshness::Fresh(_)));
    }

    #[test]
    fn sweep_drops_expired_entries_once_threshold_is_crossed() {
        let cache = cache_with_ttl_ms(1000);
        let t0 = Instant::now();
        for i in 0..SWEEP_THRESHOLD {
            cache.put_at(&format!("old-{i}"), handle("x"), t0);
        }
        assert_eq!(cache.len(), SWEEP_THRESHOLD);

        // All old entries have expired by now; inserting a new id sweeps them.
        let t_late = t0 + Duration::from_millis(2000);
        cache.put_at("fresh", handle("fresh"), t_late);
        assert_eq!(cache.len(), 1);
        assert!(matches!(cache.lookup_at("fresh", t_late), Freshness::Fresh(_)));
    }

    #[test]
    fn sweep_keeps_live_entries() {
        let cache = cache_with_ttl_ms(10_000);
        let t0 = Instant::now();
        for i in 0..SWEEP_THRESHOLD {
            cache.put_at(&format!("live-{i}"), handle("x"), t0);
        }
        // Nothing has expired, so the sweep removes nothing and the insert
        // still lands. The bound is on garbage, not on live handles.
        cache.put_at("extra", handle("extra"), t0 + Duration::from_millis(1));
        assert_eq!(cache.len(), SWEEP_THRESHOLD + 1);
    }
}
