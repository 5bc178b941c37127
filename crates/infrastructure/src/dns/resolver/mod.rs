pub mod builder;
pub mod cache_layer;
pub mod core;
pub mod extract;
pub mod handle;

pub use builder::ResolverBuilder;
pub use cache_layer::CachedResolver;
pub use core::{CoreResolver, UpstreamAnswer};
pub use handle::Resolver;

use serde::Serialize;
use std::net::IpAddr;
use stubdns_domain::{DnsProtocol, ResourceRecord};

/// Address families accepted by `Resolver::lookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Family {
    #[default]
    Any,
    V4,
    V6,
}

impl Family {
    /// `0`, `4` or `6`, as host bindings pass it.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(Family::Any),
            4 => Some(Family::V4),
            6 => Some(Family::V6),
            _ => None,
        }
    }
}

/// Ordering of a combined A + AAAA result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultOrder {
    /// IPv4 answers then IPv6 answers, each in server order.
    #[default]
    Verbatim,
    Ipv4First,
    Ipv6First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressTtl {
    pub address: IpAddr,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MxRecord {
    pub priority: u16,
    pub exchange: String,
}

/// Result of a typed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Records of the asked type, in server order.
    pub records: Vec<ResourceRecord>,
    /// CNAME targets followed to reach `records`.
    pub aliases: Vec<String>,
    /// Seconds this answer remains valid.
    pub ttl: u32,
    pub cache_hit: bool,
    pub stale: bool,
    /// Server that answered; `None` for cache hits.
    pub server: Option<DnsProtocol>,
}

impl Answer {
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.records.iter().filter_map(|rr| rr.ip_addr()).collect()
    }

    pub fn address_ttls(&self) -> Vec<AddressTtl> {
        self.records
            .iter()
            .filter_map(|rr| {
                rr.ip_addr().map(|address| AddressTtl {
                    address,
                    ttl: rr.ttl,
                })
            })
            .collect()
    }
}
