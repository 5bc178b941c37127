use super::{RecordData, RecordType};
use std::net::IpAddr;

/// The IN class.
pub const CLASS_IN: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn new(name: impl Into<String>, record_type: RecordType, ttl: u32, data: RecordData) -> Self {
        Self {
            name: name.into(),
            rtype: record_type.to_u16(),
            class: CLASS_IN,
            ttl,
            data,
        }
    }

    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_u16(self.rtype)
    }

    pub fn ip_addr(&self) -> Option<IpAddr> {
        self.data.ip_addr()
    }

    pub fn is_expired(&self, elapsed_secs: u32) -> bool {
        elapsed_secs >= self.ttl
    }

    pub fn remaining_ttl(&self, elapsed_secs: u32) -> u32 {
        self.ttl.saturating_sub(elapsed_secs)
    }
}
