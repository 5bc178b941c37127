use super::{Hostname, RecordType};

/// What the caller asked for: a validated name and a record type.
///
/// The wire-level query (transaction id, flags) is derived from this once
/// per attempt by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsQuery {
    pub domain: Hostname,
    pub record_type: RecordType,
}

impl DnsQuery {
    pub fn new(domain: Hostname, record_type: RecordType) -> Self {
        Self {
            domain,
            record_type,
        }
    }
}
