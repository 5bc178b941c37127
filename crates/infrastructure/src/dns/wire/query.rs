use super::message::Question;
use stubdns_domain::{DnsQuery, Hostname, RecordType};

/// One attempt's worth of query: the name and type plus a transaction id.
///
/// A fresh `Query` (and therefore a fresh random id) is built for every
/// attempt, including retries against the same server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub id: u16,
    pub name: Hostname,
    pub record_type: RecordType,
    pub recursion_desired: bool,
}

impl Query {
    pub fn new(query: &DnsQuery) -> Self {
        Self::with_id(query, fastrand::u16(..))
    }

    pub fn with_id(query: &DnsQuery, id: u16) -> Self {
        Self {
            id,
            name: query.domain.clone(),
            record_type: query.record_type,
            recursion_desired: true,
        }
    }

    pub fn question(&self) -> Question {
        Question::new(self.name.as_str(), self.record_type)
    }
}
