use super::extract::{answer_ttl, relevant_records};
use crate::dns::upstream::{FailoverStrategy, RetryPolicy, UpstreamConnector};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use stubdns_domain::{DnsProtocol, DnsQuery, DomainError, ResourceRecord};
use tracing::{debug, info};

/// A validated upstream answer, ready for caching.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    /// Records of the asked type plus the CNAMEs leading to them.
    pub records: Vec<ResourceRecord>,
    /// Cache lifetime before clamping; `None` means do not cache.
    pub ttl: Option<u32>,
    pub server: DnsProtocol,
    pub attempts: usize,
}

/// Walks the configured servers for one question and extracts the answer.
///
/// The server list can be replaced at any time; each resolution works on the
/// snapshot it loaded when it started.
pub struct CoreResolver {
    servers: ArcSwap<Vec<DnsProtocol>>,
    connector: Arc<dyn UpstreamConnector>,
    policy: RetryPolicy,
    rotate: bool,
    next_start: AtomicUsize,
    strategy: FailoverStrategy,
}

impl CoreResolver {
    pub fn new(
        servers: Vec<DnsProtocol>,
        connector: Arc<dyn UpstreamConnector>,
        policy: RetryPolicy,
        rotate: bool,
    ) -> Self {
        info!(
            servers = servers.len(),
            tries = policy.tries,
            timeout_ms = policy.timeout.as_millis() as u64,
            rotate,
            "Core DNS resolver created"
        );

        Self {
            servers: ArcSwap::from_pointee(servers),
            connector,
            policy,
            rotate,
            next_start: AtomicUsize::new(0),
            strategy: FailoverStrategy::new(),
        }
    }

    pub fn servers(&self) -> Arc<Vec<DnsProtocol>> {
        self.servers.load_full()
    }

    pub fn set_servers(&self, servers: Vec<DnsProtocol>) {
        info!(servers = servers.len(), "Replacing upstream servers");
        self.servers.store(Arc::new(servers));
    }

    pub fn connector(&self) -> &Arc<dyn UpstreamConnector> {
        &self.connector
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn resolve(&self, query: &DnsQuery) -> Result<UpstreamAnswer, DomainError> {
        let servers = self.servers.load_full();
        let start_index = if self.rotate && !servers.is_empty() {
            self.next_start.fetch_add(1, AtomicOrdering::Relaxed) % servers.len()
        } else {
            0
        };

        let result = self
            .strategy
            .query(
                self.connector.as_ref(),
                &servers,
                start_index,
                query,
                &self.policy,
            )
            .await?;

        let records = relevant_records(&result.message, query.record_type);
        let ttl = answer_ttl(&result.message, &records);

        debug!(
            domain = %query.domain,
            record_type = %query.record_type,
            records = records.len(),
            ttl = ?ttl,
            upstream = %result.server,
            attempts = result.attempts,
            "Upstream query successful"
        );

        Ok(UpstreamAnswer {
            records,
            ttl,
            server: result.server,
            attempts: result.attempts,
        })
    }
}
