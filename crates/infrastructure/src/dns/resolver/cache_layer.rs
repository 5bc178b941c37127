use super::core::{CoreResolver, UpstreamAnswer};
use super::extract::split_chain;
use super::Answer;
use crate::dns::cache::{CacheHit, DnsCache};
use arc_swap::ArcSwap;
use std::sync::Arc;
use stubdns_domain::{CacheConfig, CachePolicy, DnsQuery, DomainError};
use tracing::{debug, info};

/// Puts the cache policy in front of `CoreResolver`.
///
/// Failed resolutions and NXDOMAIN are never cached. The policy can be
/// swapped at runtime; a request keeps the policy it started with.
pub struct CachedResolver {
    core: Arc<CoreResolver>,
    cache: Option<Arc<DnsCache>>,
    config: ArcSwap<CacheConfig>,
}

impl CachedResolver {
    pub fn new(core: Arc<CoreResolver>, cache: Option<Arc<DnsCache>>, config: CacheConfig) -> Self {
        let cache = cache.filter(|_| config.enabled);
        Self {
            core,
            cache,
            config: ArcSwap::from_pointee(config),
        }
    }

    pub fn core(&self) -> &Arc<CoreResolver> {
        &self.core
    }

    pub fn cache(&self) -> Option<&Arc<DnsCache>> {
        self.cache.as_ref()
    }

    pub fn policy(&self) -> CachePolicy {
        self.config.load().policy
    }

    /// Switches the policy and the stale window for requests that start
    /// after this call.
    pub fn set_policy(&self, policy: CachePolicy, stale_ttl_secs: u32) {
        info!(policy = policy.as_str(), stale_ttl_secs, "Changing cache policy");
        self.config.rcu(|current| CacheConfig {
            policy,
            stale_ttl_secs,
            ..CacheConfig::clone(current)
        });
    }

    pub async fn resolve(&self, query: &DnsQuery) -> Result<Answer, DomainError> {
        let config = self.config.load_full();
        let cache = match &self.cache {
            Some(cache) if config.policy != CachePolicy::Bypass => cache,
            _ => {
                let upstream = self.core.resolve(query).await?;
                return Ok(answer_from_upstream(query, upstream, &config));
            }
        };

        let domain = query.domain.as_str();
        if let Some(hit) = cache.get(domain, query.record_type) {
            debug!(domain = %query.domain, record_type = %query.record_type, "Cache HIT");
            return Ok(answer_from_hit(query, hit));
        }

        let max_stale = config.stale_ttl_secs as u64;
        if config.policy == CachePolicy::StaleWhileRevalidate {
            if let Some(hit) = cache.get_stale(domain, query.record_type, max_stale) {
                debug!(domain = %query.domain, record_type = %query.record_type, "Serving stale entry");
                if cache.begin_refresh(domain, query.record_type) {
                    spawn_refresh(
                        Arc::clone(&self.core),
                        Arc::clone(cache),
                        Arc::clone(&config),
                        query.clone(),
                    );
                }
                return Ok(answer_from_hit(query, hit));
            }
        }

        match self.core.resolve(query).await {
            Ok(upstream) => {
                store(cache, query, &upstream, &config);
                Ok(answer_from_upstream(query, upstream, &config))
            }
            Err(e) if config.policy == CachePolicy::StaleIfError => {
                match cache.get_stale(domain, query.record_type, max_stale) {
                    Some(hit) if every_server_failed(&e) => {
                        debug!(
                            domain = %query.domain,
                            record_type = %query.record_type,
                            error = %e,
                            "Upstream failed, serving stale entry"
                        );
                        Ok(answer_from_hit(query, hit))
                    }
                    _ => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}

/// NXDOMAIN is an answer, not a failure, even when it exhausted the list.
fn every_server_failed(e: &DomainError) -> bool {
    matches!(e, DomainError::Exhausted { .. }) && !e.is_nxdomain()
}

fn spawn_refresh(
    core: Arc<CoreResolver>,
    cache: Arc<DnsCache>,
    config: Arc<CacheConfig>,
    query: DnsQuery,
) {
    tokio::spawn(async move {
        match core.resolve(&query).await {
            Ok(upstream) => {
                debug!(domain = %query.domain, record_type = %query.record_type, "Background refresh done");
                if !store(&cache, &query, &upstream, &config) {
                    cache.end_refresh(query.domain.as_str(), query.record_type);
                }
            }
            Err(e) => {
                debug!(domain = %query.domain, error = %e, "Background refresh failed");
                cache.end_refresh(query.domain.as_str(), query.record_type);
            }
        }
    });
}

/// Writes a fresh answer through to the cache. Returns whether it was stored.
fn store(cache: &DnsCache, query: &DnsQuery, upstream: &UpstreamAnswer, config: &CacheConfig) -> bool {
    let Some(ttl) = upstream.ttl.map(|ttl| config.clamp_ttl(ttl)) else {
        return false;
    };
    if ttl == 0 {
        return false;
    }
    cache.put(
        query.domain.as_str(),
        query.record_type,
        upstream.records.clone(),
        ttl,
    );
    true
}

fn answer_from_hit(query: &DnsQuery, hit: CacheHit) -> Answer {
    let (records, aliases) = split_chain(query.record_type, hit.records);
    Answer {
        records,
        aliases,
        ttl: hit.remaining_ttl,
        cache_hit: true,
        stale: hit.stale,
        server: None,
    }
}

fn answer_from_upstream(query: &DnsQuery, upstream: UpstreamAnswer, config: &CacheConfig) -> Answer {
    let ttl = upstream.ttl.map(|ttl| config.clamp_ttl(ttl)).unwrap_or(0);
    let (records, aliases) = split_chain(query.record_type, upstream.records);
    Answer {
        records,
        aliases,
        ttl,
        cache_hit: false,
        stale: false,
        server: Some(upstream.server),
    }
}
