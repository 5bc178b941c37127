use super::connector::UpstreamConnector;
use crate::dns::wire::{Message, Query};
use std::time::Duration;
use stubdns_domain::{DnsProtocol, DnsQuery, DomainError, ResolverConfig};
use tracing::{debug, warn};

/// How many times the server list is walked and how long each attempt may
/// take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub tries: u32,
    pub timeout: Duration,
    pub max_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            tries: config.tries.max(1),
            timeout: config.timeout(),
            max_timeout: config.max_timeout().max(config.timeout()),
        }
    }

    /// Per-attempt timeout for pass `pass` (0-based): doubles every pass,
    /// never above `max_timeout`.
    pub fn timeout_for_pass(&self, pass: u32) -> Duration {
        let factor = 1u32.checked_shl(pass).unwrap_or(u32::MAX);
        self.timeout
            .checked_mul(factor)
            .unwrap_or(self.max_timeout)
            .min(self.max_timeout)
    }

    /// Upper bound on attempts for `servers` servers.
    pub fn max_attempts(&self, servers: usize) -> usize {
        servers * self.tries as usize
    }
}

/// Successful upstream exchange: a NOERROR response and who sent it.
#[derive(Debug)]
pub struct UpstreamResult {
    pub message: Message,
    pub server: DnsProtocol,
    pub attempts: usize,
}

/// Walks the server list in order, `tries` times, until one server returns
/// NOERROR.
///
/// Transport errors, undecodable responses and error RCODEs all count as that
/// server's failure and move on to the next. When every attempt failed the
/// result is `Exhausted` carrying the last failure.
pub struct FailoverStrategy;

impl FailoverStrategy {
    pub fn new() -> Self {
        Self
    }

    pub async fn query(
        &self,
        connector: &dyn UpstreamConnector,
        servers: &[DnsProtocol],
        start_index: usize,
        query: &DnsQuery,
        policy: &RetryPolicy,
    ) -> Result<UpstreamResult, DomainError> {
        if servers.is_empty() {
            return Err(DomainError::NoServers);
        }
        debug!(
            strategy = "failover",
            servers = servers.len(),
            tries = policy.tries,
            domain = %query.domain,
            record_type = %query.record_type,
            "Trying sequentially"
        );

        let mut attempts = 0usize;
        let mut last_error: Option<DomainError> = None;

        for pass in 0..policy.tries {
            let timeout = policy.timeout_for_pass(pass);

            for offset in 0..servers.len() {
                let index = (start_index + offset) % servers.len();
                let server = &servers[index];
                attempts += 1;

                let wire_query = Query::new(query);
                let outcome = connector
                    .exchange(server, &wire_query, timeout)
                    .await
                    .and_then(check_rcode);

                match outcome {
                    Ok(message) => {
                        debug!(server = %server, position = index, pass, attempts, "Server responded");
                        return Ok(UpstreamResult {
                            message,
                            server: server.clone(),
                            attempts,
                        });
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(server = %server, error = %e, position = index, pass, "Failing over");
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Err(DomainError::Exhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(DomainError::NoServers)),
        })
    }
}

impl Default for FailoverStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn check_rcode(message: Message) -> Result<Message, DomainError> {
    match message.rcode().to_error() {
        None => Ok(message),
        Some(e) => Err(e.into()),
    }
}
