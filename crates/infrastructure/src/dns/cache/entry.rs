use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use stubdns_domain::ResourceRecord;

/// Records for one (name, type) key, stored as a unit.
///
/// Expires once `now - inserted_at_secs >= min_ttl`. An empty `records` slice
/// is a cached NODATA answer.
#[derive(Debug)]
pub struct CacheEntry {
    pub records: Arc<[ResourceRecord]>,
    pub inserted_at_secs: u64,
    pub min_ttl: u32,
    hits: AtomicU64,
    refreshing: AtomicBool,
}

impl CacheEntry {
    pub fn new(records: Arc<[ResourceRecord]>, min_ttl: u32, now_secs: u64) -> Self {
        Self {
            records,
            inserted_at_secs: now_secs,
            min_ttl,
            hits: AtomicU64::new(0),
            refreshing: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn expires_at_secs(&self) -> u64 {
        self.inserted_at_secs + self.min_ttl as u64
    }

    #[inline]
    pub fn is_expired_at(&self, now_secs: u64) -> bool {
        now_secs >= self.expires_at_secs()
    }

    #[inline]
    pub fn remaining_ttl(&self, now_secs: u64) -> u32 {
        self.expires_at_secs().saturating_sub(now_secs).min(u32::MAX as u64) as u32
    }

    /// Expired, but by less than `max_stale_secs`.
    #[inline]
    pub fn is_stale_usable_at(&self, now_secs: u64, max_stale_secs: u64) -> bool {
        self.is_expired_at(now_secs) && now_secs < self.expires_at_secs() + max_stale_secs
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Claims the refresh slot. Only the first caller gets `true` until
    /// `end_refresh`.
    pub fn try_begin_refresh(&self) -> bool {
        self.refreshing
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Relaxed)
            .is_ok()
    }

    pub fn end_refresh(&self) {
        self.refreshing.store(false, AtomicOrdering::Release);
    }

    /// Copies the records with each TTL lowered by the time spent in cache.
    pub fn records_at(&self, now_secs: u64) -> Vec<ResourceRecord> {
        let elapsed = now_secs
            .saturating_sub(self.inserted_at_secs)
            .min(u32::MAX as u64) as u32;
        self.records
            .iter()
            .map(|rr| {
                let mut rr = rr.clone();
                rr.ttl = rr.remaining_ttl(elapsed);
                rr
            })
            .collect()
    }
}

/// What `DnsCache::get` and `DnsCache::get_stale` hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit {
    pub records: Vec<ResourceRecord>,
    pub remaining_ttl: u32,
    pub stale: bool,
}
