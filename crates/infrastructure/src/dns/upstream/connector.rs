use super::query::query_server;
use crate::dns::transport::TransportOptions;
use crate::dns::wire::{Message, Query};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use stubdns_domain::{DnsProtocol, DomainError, ResolverConfig};
use tracing::info;

/// One exchange with one upstream server.
///
/// The resolver core only ever talks to upstreams through this trait, which
/// keeps retry and cache logic testable without sockets.
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Query,
        timeout: Duration,
    ) -> Result<Message, DomainError>;

    /// Source addresses for sockets opened from now on. `None` lets the OS
    /// choose. Connectors without sockets ignore this.
    fn set_local_address(&self, _v4: Option<Ipv4Addr>, _v6: Option<Ipv6Addr>) {}
}

/// Production connector: real sockets via the transport layer.
#[derive(Debug)]
pub struct NetworkConnector {
    options: ArcSwap<TransportOptions>,
    edns_udp_size: Option<u16>,
}

impl NetworkConnector {
    pub fn new(options: TransportOptions, edns_udp_size: Option<u16>) -> Self {
        Self {
            options: ArcSwap::from_pointee(options),
            edns_udp_size,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(TransportOptions::from_config(config), config.edns_udp_size)
    }

    pub fn options(&self) -> TransportOptions {
        **self.options.load()
    }
}

#[async_trait]
impl UpstreamConnector for NetworkConnector {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Query,
        timeout: Duration,
    ) -> Result<Message, DomainError> {
        let options = self.options();
        let result = query_server(server, query, &options, self.edns_udp_size, timeout).await?;
        Ok(result.message)
    }

    fn set_local_address(&self, v4: Option<Ipv4Addr>, v6: Option<Ipv6Addr>) {
        info!(?v4, ?v6, "Setting local source addresses");
        self.options.rcu(|current| TransportOptions {
            local_address_v4: v4,
            local_address_v6: v6,
            ..**current
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_local_address_replaces_both_families() {
        let connector = NetworkConnector::from_config(&ResolverConfig {
            local_address_v6: Some(Ipv6Addr::LOCALHOST),
            ..Default::default()
        });
        let payload = connector.options().udp_payload_size;

        connector.set_local_address(Some(Ipv4Addr::LOCALHOST), None);
        let options = connector.options();
        assert_eq!(options.local_address_v4, Some(Ipv4Addr::LOCALHOST));
        assert_eq!(options.local_address_v6, None);
        assert_eq!(options.udp_payload_size, payload);
    }
}
