use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Decoded record data. Names are lower-cased presentation strings without
/// the trailing dot; the root name is the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(String),
    Cname(String),
    Ptr(String),
    Mx { preference: u16, exchange: String },
    Txt(Vec<Vec<u8>>),
    Soa(SoaData),
    Srv(SrvData),
    Naptr(NaptrData),
    Tlsa(TlsaData),
    Caa(CaaData),
    /// EDNS(0) pseudo-record; the payload size lives in the record class.
    Opt(Vec<u8>),
    Unknown(Vec<u8>),
}

impl RecordData {
    pub fn ip_addr(&self) -> Option<IpAddr> {
        match self {
            RecordData::A(v4) => Some(IpAddr::V4(*v4)),
            RecordData::Aaaa(v6) => Some(IpAddr::V6(*v6)),
            _ => None,
        }
    }

    /// Target name of records that point at another name.
    pub fn target_name(&self) -> Option<&str> {
        match self {
            RecordData::Ns(n) | RecordData::Cname(n) | RecordData::Ptr(n) => Some(n),
            RecordData::Mx { exchange, .. } => Some(exchange),
            RecordData::Srv(srv) => Some(&srv.target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvData {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaptrData {
    pub order: u16,
    pub preference: u16,
    pub flags: Vec<u8>,
    pub services: Vec<u8>,
    pub regexp: Vec<u8>,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsaData {
    pub cert_usage: u8,
    pub selector: u8,
    pub matching_type: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaaData {
    pub critical: bool,
    pub tag: String,
    pub value: Vec<u8>,
}
