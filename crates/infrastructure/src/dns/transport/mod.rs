pub mod tcp;
#[cfg(feature = "dns-over-rustls")]
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use stubdns_domain::{DnsProtocol, ResolverConfig, TransportError};

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
    pub protocol_used: &'static str,
}

/// Sends one encoded query and returns the raw bytes of the matching
/// response.
///
/// Every call opens its own socket and closes it on return, whether the
/// exchange succeeded, failed or timed out. Dropping the returned future
/// closes the socket as well.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;

    fn protocol_name(&self) -> &'static str;
}

/// Socket options shared by all transports of one resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub local_address_v4: Option<Ipv4Addr>,
    pub local_address_v6: Option<Ipv6Addr>,
    /// Receive buffer size for UDP responses.
    pub udp_payload_size: u16,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl TransportOptions {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            local_address_v4: config.local_address_v4,
            local_address_v6: config.local_address_v6,
            udp_payload_size: config.udp_payload_size(),
        }
    }

    /// Local address for a socket talking to `server`, port 0 so the OS
    /// picks an ephemeral port.
    pub fn bind_addr(&self, server: SocketAddr) -> SocketAddr {
        match server {
            SocketAddr::V4(_) => {
                SocketAddr::from((self.local_address_v4.unwrap_or(Ipv4Addr::UNSPECIFIED), 0))
            }
            SocketAddr::V6(_) => {
                SocketAddr::from((self.local_address_v6.unwrap_or(Ipv6Addr::UNSPECIFIED), 0))
            }
        }
    }

    /// Whether a local address was configured for this server's family.
    pub fn has_local_addr(&self, server: SocketAddr) -> bool {
        match server {
            SocketAddr::V4(_) => self.local_address_v4.is_some(),
            SocketAddr::V6(_) => self.local_address_v6.is_some(),
        }
    }
}

pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
    #[cfg(feature = "dns-over-rustls")]
    Tls(tls::TlsTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(_) => "TLS",
        }
    }
}

pub fn create_transport(
    protocol: &DnsProtocol,
    options: &TransportOptions,
) -> Result<Transport, TransportError> {
    match protocol {
        DnsProtocol::Udp { addr } => Ok(Transport::Udp(udp::UdpTransport::new(*addr, options))),
        DnsProtocol::Tcp { addr } => Ok(Transport::Tcp(tcp::TcpTransport::new(*addr, options))),

        #[cfg(feature = "dns-over-rustls")]
        DnsProtocol::Tls { addr, hostname } => Ok(Transport::Tls(tls::TlsTransport::new(
            *addr,
            hostname.to_string(),
            options,
        ))),

        #[cfg(not(feature = "dns-over-rustls"))]
        DnsProtocol::Tls { addr, .. } => Err(TransportError::Tls {
            server: addr.to_string(),
            message: "built without the 'dns-over-rustls' feature".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr_defaults_to_unspecified() {
        let options = TransportOptions::default();
        let v4: SocketAddr = "8.8.8.8:53".parse().unwrap();
        let v6: SocketAddr = "[2001:4860:4860::8888]:53".parse().unwrap();
        assert_eq!(options.bind_addr(v4), "0.0.0.0:0".parse().unwrap());
        assert_eq!(options.bind_addr(v6), "[::]:0".parse().unwrap());
        assert!(!options.has_local_addr(v4));
    }

    #[test]
    fn test_bind_addr_uses_configured_local_address() {
        let options = TransportOptions {
            local_address_v4: Some(Ipv4Addr::new(192, 0, 2, 10)),
            ..Default::default()
        };
        let v4: SocketAddr = "8.8.8.8:53".parse().unwrap();
        assert_eq!(options.bind_addr(v4), "192.0.2.10:0".parse().unwrap());
        assert!(options.has_local_addr(v4));
    }

    #[test]
    fn test_create_transport_dispatch() {
        let options = TransportOptions::default();
        let udp = create_transport(&"8.8.8.8".parse().unwrap(), &options).unwrap();
        assert_eq!(udp.protocol_name(), "UDP");
        let tcp = create_transport(&"tcp://8.8.8.8".parse().unwrap(), &options).unwrap();
        assert_eq!(tcp.protocol_name(), "TCP");
    }
}
