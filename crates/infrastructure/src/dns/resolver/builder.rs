use super::cache_layer::CachedResolver;
use super::core::CoreResolver;
use super::handle::Resolver;
use crate::dns::cache::{spawn_eviction_task, Clock, DnsCache, SystemClock};
use crate::dns::upstream::{NetworkConnector, RetryPolicy, UpstreamConnector};
use std::sync::Arc;
use std::time::Duration;
use stubdns_domain::{
    CacheConfig, CachePolicy, Config, ConfigError, DnsProtocol, DomainError, ResolverConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct ResolverBuilder {
    resolver_config: ResolverConfig,
    cache_config: CacheConfig,
    servers: Option<Vec<DnsProtocol>>,
    connector: Option<Arc<dyn UpstreamConnector>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            resolver_config: ResolverConfig::default(),
            cache_config: CacheConfig::default(),
            servers: None,
            connector: None,
            clock: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_resolver_config(config.resolver.clone())
            .with_cache_config(config.cache.clone())
    }

    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Uses these endpoints instead of the configured server strings.
    pub fn with_servers(mut self, servers: Vec<DnsProtocol>) -> Self {
        self.servers = Some(servers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_config.timeout_ms = timeout.as_millis() as u64;
        self.resolver_config.max_timeout_ms = self
            .resolver_config
            .max_timeout_ms
            .max(self.resolver_config.timeout_ms);
        self
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.resolver_config.tries = tries;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_config.policy = policy;
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn UpstreamConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Resolver, DomainError> {
        let servers = match self.servers {
            Some(servers) => {
                if self.resolver_config.timeout_ms == 0 || self.resolver_config.tries == 0 {
                    return Err(ConfigError::Validation(
                        "timeout_ms and tries must be greater than 0".to_string(),
                    )
                    .into());
                }
                servers
            }
            None => {
                self.resolver_config.validate()?;
                self.resolver_config.endpoints()?
            }
        };
        self.cache_config.validate()?;

        info!(
            servers = servers.len(),
            cache = self.cache_config.is_active(),
            policy = self.cache_config.policy.as_str(),
            "Building DNS resolver"
        );

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(NetworkConnector::from_config(&self.resolver_config)));
        let core = Arc::new(CoreResolver::new(
            servers,
            connector,
            RetryPolicy::from_config(&self.resolver_config),
            self.resolver_config.rotate,
        ));

        // Built even under Bypass so the policy can be switched later.
        let cache = self.cache_config.enabled.then(|| {
            let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
            Arc::new(DnsCache::new(self.cache_config.max_entries, clock))
        });

        let maintenance = cache
            .as_ref()
            .and_then(|cache| start_eviction(cache, &self.cache_config));

        let cached = CachedResolver::new(core, cache, self.cache_config);
        Ok(Resolver::from_parts(cached, maintenance))
    }
}

fn start_eviction(
    cache: &Arc<DnsCache>,
    config: &CacheConfig,
) -> Option<tokio_util::sync::DropGuard> {
    if config.eviction_interval_secs == 0 {
        return None;
    }
    if tokio::runtime::Handle::try_current().is_err() {
        warn!("No tokio runtime; background cache eviction disabled");
        return None;
    }

    let shutdown = CancellationToken::new();
    spawn_eviction_task(
        Arc::downgrade(cache),
        Duration::from_secs(config.eviction_interval_secs),
        config.eviction_grace_secs,
        shutdown.clone(),
    );
    Some(shutdown.drop_guard())
}
