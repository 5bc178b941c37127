//! DNS-over-TLS transport (RFC 7858)
//!
//! Same framing as TCP. The client config is built once and shared, so TLS
//! session resumption still applies even though every query opens a fresh
//! connection.

use super::tcp::{connect, read_matching_response, send_with_length_prefix};
use super::{DnsTransport, TransportOptions, TransportResponse};
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use stubdns_domain::TransportError;
use tracing::debug;

/// Shared TLS config: webpki roots, no client auth.
static SHARED_TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

/// DNS-over-TLS transport (RFC 7858)
pub struct TlsTransport {
    server_addr: SocketAddr,
    hostname: String,
    bind_addr: Option<SocketAddr>,
}

impl TlsTransport {
    pub fn new(server_addr: SocketAddr, hostname: String, options: &TransportOptions) -> Self {
        let bind_addr = options
            .has_local_addr(server_addr)
            .then(|| options.bind_addr(server_addr));
        Self {
            server_addr,
            hostname,
            bind_addr,
        }
    }

    fn tls_error(&self, message: impl ToString) -> TransportError {
        TransportError::Tls {
            server: self.server_addr.to_string(),
            message: message.to_string(),
        }
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, TransportError> {
        let server_name = ServerName::try_from(self.hostname.clone()).map_err(|e| {
            self.tls_error(format!("invalid server name '{}': {}", self.hostname, e))
        })?;

        let tcp_stream = connect(self.server_addr, self.bind_addr).await?;

        let connector = tokio_rustls::TlsConnector::from(SHARED_TLS_CONFIG.clone());
        let mut stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| self.tls_error(format!("handshake failed: {}", e)))?;

        debug!(server = %self.server_addr, hostname = %self.hostname, "TLS connection established");

        send_with_length_prefix(&mut stream, message_bytes)
            .await
            .map_err(|e| TransportError::from_io(self.server_addr, &e))?;

        let response_bytes = read_matching_response(&mut stream, message_bytes, self.server_addr)
            .await
            .map_err(|e| TransportError::from_io(self.server_addr, &e))?;

        debug!(
            server = %self.server_addr,
            response_len = response_bytes.len(),
            "TLS response received"
        );
        Ok(response_bytes)
    }
}

#[async_trait]
impl DnsTransport for TlsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| TransportError::Timeout {
                server: self.server_addr.to_string(),
            })??;

        Ok(TransportResponse {
            bytes,
            protocol_used: "TLS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }
}
