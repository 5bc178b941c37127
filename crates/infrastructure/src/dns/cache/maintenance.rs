use super::storage::DnsCache;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodically removes entries that expired more than `grace_secs` ago.
///
/// The task holds only a weak reference and exits once the cache is dropped
/// or `shutdown` is cancelled. Must be called from within a tokio runtime.
pub fn spawn_eviction_task(
    cache: Weak<DnsCache>,
    interval: Duration,
    grace_secs: u64,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), grace_secs, "Starting cache eviction task");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(cache) = cache.upgrade() else {
                break;
            };
            let removed = cache.evict_expired(grace_secs);
            debug!(removed, remaining = cache.len(), "Cache eviction pass");
        }

        debug!("Cache eviction task stopped");
    })
}
