use super::json::addresses_json;
use crate::dns::resolver::{Answer, Family, Resolver, ResolverBuilder, ResultOrder};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use stubdns_domain::{CachePolicy, Config, DnsProtocol, DomainError, RecordType};
use tokio::runtime::Runtime;
use tracing::info;

/// Synchronous front end for host threads that cannot await.
///
/// Owns a multi-threaded tokio runtime; any number of threads may call into
/// it at once. Must not be called from inside an async context.
pub struct BlockingResolver {
    runtime: Runtime,
    resolver: Resolver,
}

impl BlockingResolver {
    pub fn new(config: &Config) -> Result<Self, DomainError> {
        Self::from_builder(ResolverBuilder::from_config(config))
    }

    /// From the host-side JSON options, e.g. `{"servers": ["1.1.1.1"],
    /// "timeout": 3000, "tries": 2, "cacheSize": 500}`.
    pub fn from_json(options: &str) -> Result<Self, DomainError> {
        let config = Config::from_json(options)?;
        Self::from_builder(ResolverBuilder::from_config(&config))
    }

    pub fn from_builder(builder: ResolverBuilder) -> Result<Self, DomainError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("stubdns-worker")
            .build()
            .map_err(|e| DomainError::Config(format!("failed to start runtime: {}", e)))?;

        let resolver = {
            let _guard = runtime.enter();
            builder.build()?
        };

        info!("Blocking resolver ready");
        Ok(Self { runtime, resolver })
    }

    /// The async resolver behind this facade.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, DomainError> {
        self.runtime.block_on(self.resolver.resolve(hostname))
    }

    /// Like `resolve`, but gives up with `Cancelled` once `deadline` has
    /// passed. Sockets of the abandoned attempt are closed.
    pub fn resolve_with_deadline(
        &self,
        hostname: &str,
        deadline: Duration,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.runtime.block_on(async {
            tokio::time::timeout(deadline, self.resolver.resolve(hostname))
                .await
                .map_err(|_| DomainError::Cancelled)?
        })
    }

    /// Address array as JSON. Pair with [`error_json`](super::error_json) to hand failures to
    /// the host as `{"code", "message"}`.
    pub fn resolve_json(&self, hostname: &str) -> Result<String, DomainError> {
        self.resolve(hostname).map(|addresses| addresses_json(&addresses))
    }

    pub fn lookup(
        &self,
        host: &str,
        family: Family,
        order: ResultOrder,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.runtime
            .block_on(self.resolver.lookup(host, family, order))
    }

    pub fn reverse(&self, ip: IpAddr) -> Result<Vec<String>, DomainError> {
        self.runtime.block_on(self.resolver.reverse(ip))
    }

    pub fn query(&self, hostname: &str, record_type: RecordType) -> Result<Answer, DomainError> {
        self.runtime
            .block_on(self.resolver.query(hostname, record_type))
    }

    pub fn cancel(&self) {
        self.resolver.cancel();
    }

    pub fn set_servers<S: AsRef<str>>(&self, servers: &[S]) -> Result<(), DomainError> {
        self.resolver.set_servers(servers)
    }

    pub fn servers(&self) -> Vec<DnsProtocol> {
        self.resolver.servers()
    }

    pub fn clear_cache(&self) {
        self.resolver.clear_cache();
    }

    pub fn set_cache_policy(&self, policy: CachePolicy, stale_ttl_secs: u32) {
        self.resolver.set_cache_policy(policy, stale_ttl_secs);
    }

    pub fn set_cache_size(&self, max_entries: usize) -> Result<(), DomainError> {
        self.resolver.set_cache_size(max_entries)
    }

    pub fn set_local_address(&self, v4: Option<Ipv4Addr>, v6: Option<Ipv6Addr>) {
        self.resolver.set_local_address(v4, v6);
    }
}
