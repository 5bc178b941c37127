//! stubdns infrastructure: wire codec, transports, upstream failover, cache
//! and the resolver built on top of them.
pub mod dns;
