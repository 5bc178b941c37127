//! stubdns domain layer: names, records, endpoints, configuration and errors.
pub mod config;
pub mod dns_protocol;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod hostname;

pub use config::{
    CacheConfig, CachePolicy, CliOverrides, Config, ConfigError, LogFormat, LoggingConfig,
    ResolverConfig,
};
pub use dns_protocol::{parse_servers, DnsProtocol, DEFAULT_DNS_PORT, DEFAULT_DOT_PORT};
pub use dns_query::DnsQuery;
pub use dns_record::{
    CaaData, NaptrData, RecordData, RecordType, ResourceRecord, SoaData, SrvData, TlsaData,
};
pub use errors::{DecodeError, DomainError, Section, TransportError, UpstreamError};
pub use hostname::Hostname;
