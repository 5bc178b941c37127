use super::clock::Clock;
use super::entry::{CacheEntry, CacheHit};
use super::key::CacheKey;
use super::metrics::{CacheMetrics, CacheStats};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use stubdns_domain::{RecordType, ResourceRecord};
use tracing::{debug, info};

const EVICTION_SAMPLE_SIZE: usize = 8;

/// TTL cache for resolved records, shared by every in-flight resolution.
///
/// Expiry is lazy: `get` compares against the clock and never returns an
/// expired entry. Expired entries stay in the map, available to `get_stale`,
/// until `evict_expired` or capacity pressure removes them.
pub struct DnsCache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    max_entries: AtomicUsize,
    clock: Arc<dyn Clock>,
    metrics: Arc<CacheMetrics>,
}

impl DnsCache {
    pub fn new(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let max_entries = max_entries.max(1);
        info!(max_entries, "Initializing DNS cache");

        Self {
            entries: DashMap::with_capacity_and_hasher(max_entries.min(4096), FxBuildHasher),
            max_entries: AtomicUsize::new(max_entries),
            clock,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Fresh entry for `(domain, record_type)`, with TTLs adjusted to the time
    /// already spent in cache.
    pub fn get(&self, domain: &str, record_type: RecordType) -> Option<CacheHit> {
        let key = CacheKey::new(domain, record_type);
        let now = self.clock.now_secs();

        match self.entries.get(&key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.record_hit();
                self.metrics.hits.fetch_add(1, AtomicOrdering::Relaxed);
                Some(CacheHit {
                    records: entry.records_at(now),
                    remaining_ttl: entry.remaining_ttl(now),
                    stale: false,
                })
            }
            _ => {
                self.metrics.misses.fetch_add(1, AtomicOrdering::Relaxed);
                None
            }
        }
    }

    /// An entry that expired less than `max_stale_secs` ago. Fresh entries are
    /// not returned here. Record TTLs are reported as zero.
    pub fn get_stale(
        &self,
        domain: &str,
        record_type: RecordType,
        max_stale_secs: u64,
    ) -> Option<CacheHit> {
        let key = CacheKey::new(domain, record_type);
        let now = self.clock.now_secs();

        let entry = self.entries.get(&key)?;
        if !entry.is_stale_usable_at(now, max_stale_secs) {
            return None;
        }

        entry.record_hit();
        self.metrics.stale_hits.fetch_add(1, AtomicOrdering::Relaxed);
        Some(CacheHit {
            records: entry.records_at(now),
            remaining_ttl: 0,
            stale: true,
        })
    }

    /// Stores `records` under `(domain, record_type)` for `ttl` seconds,
    /// replacing whatever was there. A zero TTL is not stored.
    pub fn put(
        &self,
        domain: &str,
        record_type: RecordType,
        records: Vec<ResourceRecord>,
        ttl: u32,
    ) {
        if ttl == 0 {
            return;
        }
        let key = CacheKey::new(domain, record_type);
        let now = self.clock.now_secs();

        let max_entries = self.max_entries();
        if !self.entries.contains_key(&key) && self.entries.len() >= max_entries {
            self.make_room(now, max_entries - 1);
        }

        debug!(domain = %key.domain, record_type = %record_type, ttl, "Caching answer");
        self.entries
            .insert(key, CacheEntry::new(Arc::from(records), ttl, now));
        self.metrics.insertions.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn remove(&self, domain: &str, record_type: RecordType) -> bool {
        self.entries
            .remove(&CacheKey::new(domain, record_type))
            .is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.metrics.reset();
        info!("DNS cache cleared");
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn max_entries(&self) -> usize {
        self.max_entries.load(AtomicOrdering::Relaxed)
    }

    /// Changes the capacity. When shrinking below the current size, expired
    /// entries go first, then the least-hit ones.
    pub fn set_max_entries(&self, max_entries: usize) {
        let max_entries = max_entries.max(1);
        self.max_entries.store(max_entries, AtomicOrdering::Relaxed);
        info!(max_entries, "Resizing DNS cache");

        if self.entries.len() > max_entries {
            self.make_room(self.clock.now_secs(), max_entries);
        }
    }

    /// Removes entries that expired more than `grace_secs` ago. Returns how
    /// many were removed.
    pub fn evict_expired(&self, grace_secs: u64) -> usize {
        let now = self.clock.now_secs();
        let before = self.entries.len();

        self.entries
            .retain(|_, entry| now < entry.expires_at_secs() + grace_secs);

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.metrics
                .evictions
                .fetch_add(removed as u64, AtomicOrdering::Relaxed);
            debug!(removed, remaining = self.entries.len(), "Evicted expired cache entries");
        }
        removed
    }

    /// Marks the entry as being refreshed. `false` when it is missing or a
    /// refresh is already running.
    pub fn begin_refresh(&self, domain: &str, record_type: RecordType) -> bool {
        self.entries
            .get(&CacheKey::new(domain, record_type))
            .map(|entry| entry.try_begin_refresh())
            .unwrap_or(false)
    }

    pub fn end_refresh(&self, domain: &str, record_type: RecordType) {
        if let Some(entry) = self.entries.get(&CacheKey::new(domain, record_type)) {
            entry.end_refresh();
        }
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Shrinks the map to at most `target` entries.
    fn make_room(&self, now: u64, target: usize) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            self.metrics
                .evictions
                .fetch_add(purged as u64, AtomicOrdering::Relaxed);
        }

        while self.entries.len() > target {
            if !self.evict_least_hit() {
                break;
            }
        }
    }

    /// Evicts the least-hit entry among a random sample.
    fn evict_least_hit(&self) -> bool {
        let len = self.entries.len();
        if len == 0 {
            return false;
        }

        let sample = EVICTION_SAMPLE_SIZE.min(len);
        let start = fastrand::usize(..len);
        let mut candidates: Vec<(CacheKey, u64)> = self
            .entries
            .iter()
            .skip(start)
            .take(sample)
            .map(|entry| (entry.key().clone(), entry.value().hits()))
            .collect();
        if candidates.len() < sample {
            let missing = sample - candidates.len();
            candidates.extend(
                self.entries
                    .iter()
                    .take(missing)
                    .map(|entry| (entry.key().clone(), entry.value().hits())),
            );
        }

        let victim = candidates
            .into_iter()
            .min_by_key(|(_, hits)| *hits)
            .map(|(key, _)| key);

        match victim {
            Some(key) => {
                self.entries.remove(&key);
                self.metrics.evictions.fetch_add(1, AtomicOrdering::Relaxed);
                true
            }
            None => false,
        }
    }
}
