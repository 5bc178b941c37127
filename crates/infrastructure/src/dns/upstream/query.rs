use crate::dns::transport::{self, TransportOptions};
use crate::dns::wire::{self, Message, Query, CLASSIC_UDP_LIMIT};
use std::time::Duration;
use stubdns_domain::{DecodeError, DnsProtocol, DomainError, TransportError};
use tokio::time::Instant;
use tracing::debug;

/// Result of a single-server query attempt
#[derive(Debug)]
pub struct QueryAttemptResult {
    pub message: Message,
    pub protocol_used: &'static str,
    pub latency_ms: u64,
}

/// Execute a DNS query against a single upstream server via the transport layer
///
/// Encodes the query, sends it, decodes the response. A UDP exchange whose
/// answer carries the TC bit is repeated over TCP to the same address within
/// whatever is left of `timeout`. Queries too large for a UDP datagram go
/// straight to TCP.
///
/// The returned message is a well-formed response to `query`; its RCODE is
/// not interpreted here.
pub async fn query_server(
    protocol: &DnsProtocol,
    query: &Query,
    options: &TransportOptions,
    edns_udp_size: Option<u16>,
    timeout: Duration,
) -> Result<QueryAttemptResult, DomainError> {
    let start = Instant::now();
    let query_bytes = wire::encode_query(query, edns_udp_size)?;

    let udp_limit = edns_udp_size
        .map(|size| size as usize)
        .unwrap_or(CLASSIC_UDP_LIMIT)
        .max(CLASSIC_UDP_LIMIT);

    let mut protocol = protocol.clone();
    if query_bytes.len() > udp_limit {
        if let Some(tcp) = protocol.tcp_fallback() {
            debug!(server = %protocol, size = query_bytes.len(), "Query exceeds UDP limit, using TCP");
            protocol = tcp;
        }
    }

    let dns_transport = transport::create_transport(&protocol, options)?;
    let mut response = dns_transport.send(&query_bytes, timeout).await?;

    // The TC bit is checked before a full decode: a truncated answer may be
    // cut anywhere.
    if wire::is_truncated(&response.bytes) {
        if let Some(tcp_protocol) = protocol.tcp_fallback() {
            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(TransportError::Timeout {
                    server: protocol.to_string(),
                }
                .into());
            }

            debug!(
                server = %protocol,
                "Response truncated (TC bit), retrying via TCP"
            );

            let tcp_transport = transport::create_transport(&tcp_protocol, options)?;
            response = tcp_transport.send(&query_bytes, remaining).await?;
        }
    }

    let message = wire::decode(&response.bytes)?;
    if !message.header.is_response() {
        return Err(DecodeError::NotAResponse.into());
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    debug!(
        server = %protocol,
        domain = %query.name,
        record_type = %query.record_type,
        protocol = response.protocol_used,
        latency_ms,
        rcode = ?message.rcode(),
        answers = message.answers.len(),
        "Upstream answered"
    );

    Ok(QueryAttemptResult {
        message,
        protocol_used: response.protocol_used,
        latency_ms,
    })
}
