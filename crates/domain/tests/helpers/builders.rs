#![allow(dead_code)]
use stubdns_domain::{RecordData, RecordType, ResourceRecord};
use std::net::{IpAddr, Ipv4Addr};

pub struct ResourceRecordBuilder {
    name: String,
    ttl: u32,
    data: RecordData,
}

impl ResourceRecordBuilder {
    pub fn new() -> Self {
        Self {
            name: "example.com".to_string(),
            ttl: 300,
            data: RecordData::A(Ipv4Addr::new(93, 184, 216, 34)),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn address(mut self, addr: &str) -> Self {
        self.data = match addr.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => RecordData::A(v4),
            Ok(IpAddr::V6(v6)) => RecordData::Aaaa(v6),
            Err(_) => panic!("not an address: {addr}"),
        };
        self
    }

    pub fn data(mut self, data: RecordData) -> Self {
        self.data = data;
        self
    }

    pub fn build(self) -> ResourceRecord {
        let record_type = match &self.data {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::AAAA,
            RecordData::Ns(_) => RecordType::NS,
            RecordData::Cname(_) => RecordType::CNAME,
            RecordData::Ptr(_) => RecordType::PTR,
            RecordData::Mx { .. } => RecordType::MX,
            RecordData::Txt(_) => RecordType::TXT,
            RecordData::Soa(_) => RecordType::SOA,
            RecordData::Srv(_) => RecordType::SRV,
            RecordData::Naptr(_) => RecordType::NAPTR,
            RecordData::Tlsa(_) => RecordType::TLSA,
            RecordData::Caa(_) => RecordType::CAA,
            RecordData::Opt(_) => RecordType::OPT,
            RecordData::Unknown(_) => RecordType::ANY,
        };
        ResourceRecord::new(self.name, record_type, self.ttl, self.data)
    }
}

impl Default for ResourceRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}
