use super::header::{Header, ResponseCode, FLAG_QR, FLAG_RA, FLAG_RD};
use super::query::Query;
use stubdns_domain::dns_record::record::CLASS_IN;
use stubdns_domain::{RecordData, RecordType, ResourceRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

impl Question {
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            qtype: record_type.to_u16(),
            qclass: CLASS_IN,
        }
    }

    /// Names are compared case-insensitively; everything else exactly.
    pub fn same_as(&self, other: &Question) -> bool {
        self.qtype == other.qtype
            && self.qclass == other.qclass
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// A decoded DNS message. The header counts always describe the section
/// vectors for messages produced by `decode`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// An empty NOERROR response echoing the id and question of `query`.
    pub fn response_to(query: &Query) -> Self {
        let mut flags = FLAG_QR | FLAG_RA;
        if query.recursion_desired {
            flags |= FLAG_RD;
        }
        Self {
            header: Header {
                id: query.id,
                flags,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![query.question()],
            ..Default::default()
        }
    }

    pub fn with_rcode(mut self, rcode: ResponseCode) -> Self {
        self.header.set_rcode(rcode);
        self
    }

    pub fn with_answer(mut self, record: ResourceRecord) -> Self {
        self.answers.push(record);
        self
    }

    pub fn with_authority(mut self, record: ResourceRecord) -> Self {
        self.authorities.push(record);
        self
    }

    #[inline]
    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode()
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.header.is_truncated()
    }

    /// UDP payload size advertised by an EDNS(0) OPT record, if any.
    pub fn edns_udp_size(&self) -> Option<u16> {
        self.additionals
            .iter()
            .find(|rr| matches!(rr.data, RecordData::Opt(_)))
            .map(|rr| rr.class)
    }

    /// TTL for caching a negative answer: `min(SOA TTL, SOA MINIMUM)` of the
    /// first SOA in the authority section (RFC 2308 §5).
    pub fn negative_ttl(&self) -> Option<u32> {
        self.authorities.iter().find_map(|rr| match &rr.data {
            RecordData::Soa(soa) => Some(rr.ttl.min(soa.minimum)),
            _ => None,
        })
    }
}
