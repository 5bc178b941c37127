//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is (no framing). The socket is connected to the
//! server so the kernel drops datagrams from any other source; datagrams
//! that still do not answer our query (wrong id or question) are discarded
//! and the wait continues until the deadline.

use super::{DnsTransport, TransportOptions, TransportResponse};
use crate::dns::wire::{response_matches, CLASSIC_UDP_LIMIT};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use stubdns_domain::TransportError;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::debug;

/// DNS over UDP transport
pub struct UdpTransport {
    server_addr: SocketAddr,
    bind_addr: SocketAddr,
    max_response_size: usize,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr, options: &TransportOptions) -> Self {
        Self {
            server_addr,
            bind_addr: options.bind_addr(server_addr),
            max_response_size: (options.udp_payload_size as usize).max(CLASSIC_UDP_LIMIT),
        }
    }

    fn io_error(&self, e: &std::io::Error) -> TransportError {
        TransportError::from_io(self.server_addr, e)
    }

    fn timeout_error(&self) -> TransportError {
        TransportError::Timeout {
            server: self.server_addr.to_string(),
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let deadline = Instant::now() + timeout;

        let socket = UdpSocket::bind(self.bind_addr)
            .await
            .map_err(|e| self.io_error(&e))?;
        socket
            .connect(self.server_addr)
            .await
            .map_err(|e| self.io_error(&e))?;

        let bytes_sent = tokio::time::timeout_at(deadline, socket.send(message_bytes))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| self.io_error(&e))?;

        debug!(
            server = %self.server_addr,
            bytes_sent = bytes_sent,
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; self.max_response_size];

        loop {
            let bytes_received = tokio::time::timeout_at(deadline, socket.recv(&mut recv_buf))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| self.io_error(&e))?;

            if !response_matches(message_bytes, &recv_buf[..bytes_received]) {
                debug!(
                    server = %self.server_addr,
                    bytes_received = bytes_received,
                    "Discarding UDP datagram that does not match the query"
                );
                continue;
            }

            recv_buf.truncate(bytes_received);

            debug!(
                server = %self.server_addr,
                bytes_received = bytes_received,
                "UDP response received"
            );

            return Ok(TransportResponse {
                bytes: recv_buf,
                protocol_used: "UDP",
            });
        }
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
