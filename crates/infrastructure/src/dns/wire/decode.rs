use super::convert::{name_string, record_data, RecordTypeMapper};
use super::header::{Header, HEADER_LEN};
use super::message::{Message, Question};
use hickory_proto::error::{ProtoError, ProtoErrorKind};
use hickory_proto::op::{Header as HickoryHeader, Query as HickoryQuery};
use hickory_proto::rr::{Name, Record};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder};
use stubdns_domain::{DecodeError, ResourceRecord, Section};

/// Decodes a complete message.
///
/// Fails when the buffer ends mid-entry (`Truncated`), when a section holds
/// fewer entries than its header count (`CountMismatch`), on any malformed
/// name or record data, and when bytes remain after the last section.
pub fn decode(buf: &[u8]) -> Result<Message, DecodeError> {
    let header = Header::read(buf).ok_or(DecodeError::Truncated)?;

    let mut decoder = BinDecoder::new(buf);
    HickoryHeader::read(&mut decoder).map_err(map_error)?;

    let mut questions = Vec::with_capacity(header.qdcount.min(4) as usize);
    for i in 0..header.qdcount {
        ensure_more(&decoder, Section::Question, header.qdcount, i)?;
        let query = HickoryQuery::read(&mut decoder).map_err(map_error)?;
        questions.push(Question {
            name: name_string(query.name()),
            qtype: RecordTypeMapper::from_hickory(query.query_type()),
            qclass: u16::from(query.query_class()),
        });
    }

    let answers = read_records(&mut decoder, buf, Section::Answer, header.ancount)?;
    let authorities = read_records(&mut decoder, buf, Section::Authority, header.nscount)?;
    let additionals = read_records(&mut decoder, buf, Section::Additional, header.arcount)?;

    if !decoder.is_empty() {
        return Err(DecodeError::TrailingBytes(decoder.len()));
    }

    Ok(Message {
        header,
        questions,
        answers,
        authorities,
        additionals,
    })
}

fn ensure_more(
    decoder: &BinDecoder<'_>,
    section: Section,
    expected: u16,
    read: u16,
) -> Result<(), DecodeError> {
    if decoder.is_empty() {
        return Err(DecodeError::CountMismatch {
            section,
            expected,
            actual: read,
        });
    }
    Ok(())
}

fn read_records(
    decoder: &mut BinDecoder<'_>,
    buf: &[u8],
    section: Section,
    count: u16,
) -> Result<Vec<ResourceRecord>, DecodeError> {
    let mut records = Vec::with_capacity(count.min(32) as usize);
    for i in 0..count {
        ensure_more(decoder, section, count, i)?;
        let start = decoder.index();
        let record = Record::read(decoder).map_err(map_error)?;
        let raw = rdata_span(buf, start, decoder.index());
        records.push(to_resource_record(&record, raw));
    }
    Ok(records)
}

/// The rdata bytes of the record occupying `buf[start..end]`.
fn rdata_span(buf: &[u8], start: usize, end: usize) -> &[u8] {
    // Re-reads the owner name so the fixed fields can be skipped; both reads
    // already succeeded once.
    let mut decoder = BinDecoder::new(buf);
    let _ = decoder.read_slice(start);
    let rdata_start = match Name::read(&mut decoder) {
        Ok(_) => decoder.index() + 10,
        Err(_) => end,
    };
    buf.get(rdata_start.min(end)..end).unwrap_or_default()
}

fn to_resource_record(record: &Record, raw: &[u8]) -> ResourceRecord {
    let rtype = RecordTypeMapper::from_hickory(record.record_type());
    let ttl = record.ttl();
    ResourceRecord {
        name: name_string(record.name()),
        rtype,
        class: u16::from(record.dns_class()),
        // RFC 2181 §8: a TTL with the top bit set is treated as zero.
        ttl: if ttl > i32::MAX as u32 { 0 } else { ttl },
        data: record_data(rtype, record.data(), raw),
    }
}

const END_OF_INPUT: &str = "unexpected end of input";
const RDATA_PAST_END: &str = "rdata length too large";

fn map_error(err: ProtoError) -> DecodeError {
    match err.kind() {
        ProtoErrorKind::PointerNotPriorToLabel { idx, ptr } => DecodeError::PointerOutOfBounds {
            at: *idx,
            target: *ptr as usize,
        },
        ProtoErrorKind::LabelOverlapsWithOther { label, .. } => {
            DecodeError::PointerLoop { at: *label }
        }
        ProtoErrorKind::DomainNameTooLong(_) => DecodeError::NameTooLong,
        ProtoErrorKind::UnrecognizedLabelCode(code) => DecodeError::InvalidLabelType(*code),
        ProtoErrorKind::IncorrectRDataLengthRead { read, len } => DecodeError::RecordDataLength {
            declared: *len,
            parsed: *read,
        },
        ProtoErrorKind::Msg(msg) if msg.contains(END_OF_INPUT) || msg.contains(RDATA_PAST_END) => {
            DecodeError::Truncated
        }
        _ => DecodeError::Malformed(err.to_string()),
    }
}
