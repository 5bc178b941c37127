use crate::dns::wire::Message;
use stubdns_domain::{RecordData, RecordType, ResourceRecord};

/// Answer-section records relevant to a question of `record_type`: every
/// record of that type plus the CNAME records leading to them, in the order
/// the server sent them.
pub fn relevant_records(message: &Message, record_type: RecordType) -> Vec<ResourceRecord> {
    let cname = RecordType::CNAME.to_u16();
    message
        .answers
        .iter()
        .filter(|rr| record_type.matches(rr.rtype) || rr.rtype == cname)
        .cloned()
        .collect()
}

/// How long an answer may be cached, before clamping.
///
/// Positive answers live as long as their shortest record. NODATA answers
/// are cacheable only when the authority section carries an SOA.
pub fn answer_ttl(message: &Message, records: &[ResourceRecord]) -> Option<u32> {
    if records.is_empty() {
        return message.negative_ttl();
    }
    records.iter().map(|rr| rr.ttl).min()
}

/// Splits a cached or fresh record chain into the records of the asked type
/// and the CNAME targets that were followed.
pub fn split_chain(
    record_type: RecordType,
    chain: Vec<ResourceRecord>,
) -> (Vec<ResourceRecord>, Vec<String>) {
    if matches!(record_type, RecordType::CNAME | RecordType::ANY) {
        return (chain, Vec::new());
    }

    let mut records = Vec::with_capacity(chain.len());
    let mut aliases = Vec::new();
    for rr in chain {
        if record_type.matches(rr.rtype) {
            records.push(rr);
        } else if let RecordData::Cname(target) = rr.data {
            aliases.push(target);
        }
    }
    (records, aliases)
}
