use super::convert::{to_name, to_record, RecordTypeMapper};
use super::header::Header;
use super::message::{Message, Question};
use super::query::Query;
use hickory_proto::op::{
    Edns, Header as HickoryHeader, Message as HickoryMessage, MessageType, OpCode,
    Query as HickoryQuery,
};
use hickory_proto::rr::DNSClass;
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder};
use stubdns_domain::DomainError;

/// Encodes a single-question query, with an EDNS(0) OPT record advertising
/// `edns_udp_size` when given.
pub fn encode_query(query: &Query, edns_udp_size: Option<u16>) -> Result<Vec<u8>, DomainError> {
    let mut question = HickoryQuery::new();
    question
        .set_name(to_name(query.name.as_str())?)
        .set_query_type(RecordTypeMapper::to_hickory(query.record_type.to_u16()))
        .set_query_class(DNSClass::IN);

    let mut message = HickoryMessage::new();
    message
        .set_id(query.id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(query.recursion_desired)
        .add_query(question);

    if let Some(size) = edns_udp_size {
        let mut edns = Edns::new();
        edns.set_max_payload(size);
        message.set_edns(edns);
    }

    serialize_message(&message)
}

/// Encodes any message. Section counts are taken from the vectors, not from
/// `message.header`; the header flags are carried over bit for bit.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut header_bytes = Vec::with_capacity(super::HEADER_LEN);
    Header {
        qdcount: 0,
        ancount: 0,
        nscount: 0,
        arcount: 0,
        ..message.header
    }
    .write(&mut header_bytes);
    let header = HickoryHeader::from_bytes(&header_bytes)
        .map_err(|e| DomainError::InvalidInput(format!("unsupported header: {}", e)))?;

    let mut out = HickoryMessage::new();
    out.set_header(header);
    for question in &message.questions {
        out.add_query(to_query(question)?);
    }
    for record in &message.answers {
        out.add_answer(to_record(record)?);
    }
    for record in &message.authorities {
        out.add_name_server(to_record(record)?);
    }
    for record in &message.additionals {
        out.add_additional(to_record(record)?);
    }

    serialize_message(&out)
}

fn to_query(question: &Question) -> Result<HickoryQuery, DomainError> {
    let mut query = HickoryQuery::new();
    query
        .set_name(to_name(&question.name)?)
        .set_query_type(RecordTypeMapper::to_hickory(question.qtype))
        .set_query_class(DNSClass::from(question.qclass));
    Ok(query)
}

fn serialize_message(message: &HickoryMessage) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);

    message
        .emit(&mut encoder)
        .map_err(|e| DomainError::InvalidInput(format!("failed to serialize DNS message: {}", e)))?;

    Ok(buf)
}
