use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_DNS_PORT: u16 = 53;
pub const DEFAULT_DOT_PORT: u16 = 853;

/// An upstream resolver endpoint and the transport used to reach it.
///
/// Endpoints are always IP literals: resolving the resolver's own address
/// would need the system resolver, which this crate never calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DnsProtocol {
    /// UDP first, TCP when the response is truncated.
    Udp { addr: SocketAddr },
    /// TCP only.
    Tcp { addr: SocketAddr },
    /// DNS-over-TLS (RFC 7858). `hostname` is used for SNI and certificate
    /// verification.
    Tls { addr: SocketAddr, hostname: Arc<str> },
}

impl DnsProtocol {
    pub fn socket_addr(&self) -> SocketAddr {
        match self {
            DnsProtocol::Udp { addr } | DnsProtocol::Tcp { addr } | DnsProtocol::Tls { addr, .. } => {
                *addr
            }
        }
    }

    pub fn hostname(&self) -> Option<&str> {
        match self {
            DnsProtocol::Tls { hostname, .. } => Some(hostname),
            _ => None,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            DnsProtocol::Udp { .. } => "UDP",
            DnsProtocol::Tcp { .. } => "TCP",
            DnsProtocol::Tls { .. } => "TLS",
        }
    }

    /// The TCP endpoint used when a UDP answer comes back truncated.
    pub fn tcp_fallback(&self) -> Option<DnsProtocol> {
        match self {
            DnsProtocol::Udp { addr } => Some(DnsProtocol::Tcp { addr: *addr }),
            _ => None,
        }
    }
}

fn parse_addr(s: &str, default_port: u16) -> Option<SocketAddr> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Some(addr);
    }
    let bare = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);
    bare.parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, default_port))
}

impl FromStr for DnsProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(addr_str) = s.strip_prefix("udp://") {
            let addr = parse_addr(addr_str, DEFAULT_DNS_PORT)
                .ok_or_else(|| format!("Invalid UDP address '{}'", addr_str))?;
            return Ok(DnsProtocol::Udp { addr });
        }
        if let Some(addr_str) = s.strip_prefix("tcp://") {
            let addr = parse_addr(addr_str, DEFAULT_DNS_PORT)
                .ok_or_else(|| format!("Invalid TCP address '{}'", addr_str))?;
            return Ok(DnsProtocol::Tcp { addr });
        }
        if let Some(rest) = s.strip_prefix("tls://") {
            let (addr_str, name) = match rest.split_once('#') {
                Some((addr_str, name)) if !name.is_empty() => (addr_str, Some(name)),
                Some(_) => {
                    return Err(format!("Empty TLS server name in '{}'", s));
                }
                None => (rest, None),
            };
            let addr = parse_addr(addr_str, DEFAULT_DOT_PORT).ok_or_else(|| {
                format!(
                    "Invalid TLS format '{}'. Expected 'tls://IP[:PORT][#SERVER_NAME]'",
                    s
                )
            })?;
            let hostname: Arc<str> = match name {
                Some(name) => name.into(),
                None => addr.ip().to_string().into(),
            };
            return Ok(DnsProtocol::Tls { addr, hostname });
        }
        if let Some(addr) = parse_addr(s, DEFAULT_DNS_PORT) {
            return Ok(DnsProtocol::Udp { addr });
        }
        Err(format!("Invalid DNS endpoint format: '{}'. Expected: IP, IP:PORT, udp://IP[:PORT], tcp://IP[:PORT] or tls://IP[:PORT][#SERVER_NAME]", s))
    }
}

impl fmt::Display for DnsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsProtocol::Udp { addr } if addr.port() == DEFAULT_DNS_PORT => {
                write!(f, "{}", addr.ip())
            }
            DnsProtocol::Udp { addr } => write!(f, "{}", addr),
            DnsProtocol::Tcp { addr } => write!(f, "tcp://{}", addr),
            DnsProtocol::Tls { addr, hostname } => {
                if **hostname == addr.ip().to_string() {
                    write!(f, "tls://{}", addr)
                } else {
                    write!(f, "tls://{}#{}", addr, hostname)
                }
            }
        }
    }
}

/// Parses an ordered server list, failing on the first invalid entry.
pub fn parse_servers<S: AsRef<str>>(servers: &[S]) -> Result<Vec<DnsProtocol>, String> {
    servers.iter().map(|s| s.as_ref().parse()).collect()
}
