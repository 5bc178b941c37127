use hickory_proto::op::{Message as HickoryMessage, MessageType, OpCode, Query as HickoryQuery};
use hickory_proto::rr::rdata::{A, CNAME, MX, TXT};
use hickory_proto::rr::{Name, RData, Record, RecordType as HickoryType};
use hickory_proto::serialize::binary::BinEncodable;
use std::net::Ipv4Addr;
use stubdns_domain::{
    CaaData, DecodeError, DnsQuery, Hostname, NaptrData, RecordData, RecordType, ResourceRecord,
    SoaData, SrvData, TlsaData,
};
use stubdns_infrastructure::dns::wire::{self, Message, Query, ResponseCode};

mod helpers;
use helpers::{a, reply};

fn query(name: &str, record_type: RecordType) -> Query {
    Query::new(&DnsQuery::new(Hostname::parse(name).unwrap(), record_type))
}

fn hickory_response(id: u16, name: &str, answers: Vec<Record>) -> Vec<u8> {
    let name = Name::from_ascii(name).unwrap();
    let mut msg = HickoryMessage::new();
    msg.set_id(id)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .add_query(HickoryQuery::query(name, HickoryType::A));
    for record in answers {
        msg.add_answer(record);
    }
    msg.to_vec().unwrap()
}

#[test]
fn test_encoded_query_parses_with_hickory() {
    let q = query("www.Example.com", RecordType::AAAA);
    let bytes = wire::encode_query(&q, Some(1232)).unwrap();

    let parsed = HickoryMessage::from_vec(&bytes).unwrap();
    assert_eq!(parsed.id(), q.id);
    assert_eq!(parsed.message_type(), MessageType::Query);
    assert!(parsed.recursion_desired());
    assert_eq!(parsed.queries().len(), 1);
    assert_eq!(parsed.queries()[0].name().to_ascii(), "www.example.com.");
    assert_eq!(parsed.queries()[0].query_type(), HickoryType::AAAA);
    assert_eq!(parsed.extensions().as_ref().map(|e| e.max_payload()), Some(1232));
}

#[test]
fn test_query_without_edns_has_no_additionals() {
    let bytes = wire::encode_query(&query("example.com", RecordType::A), None).unwrap();
    let parsed = HickoryMessage::from_vec(&bytes).unwrap();
    assert!(parsed.extensions().is_none());
    assert_eq!(parsed.additional_count(), 0);
}

#[test]
fn test_transaction_ids_are_randomized() {
    let ids: std::collections::HashSet<u16> = (0..64)
        .map(|_| query("example.com", RecordType::A).id)
        .collect();
    assert!(ids.len() > 1);
}

#[test]
fn test_decode_compressed_hickory_response() {
    let owner = Name::from_ascii("www.example.com.").unwrap();
    let target = Name::from_ascii("edge.example.net.").unwrap();
    let answers = vec![
        Record::from_rdata(owner, 600, RData::CNAME(CNAME(target.clone()))),
        Record::from_rdata(target.clone(), 60, RData::A(A(Ipv4Addr::new(93, 184, 216, 34)))),
        Record::from_rdata(target, 60, RData::A(A(Ipv4Addr::new(93, 184, 216, 35)))),
    ];
    let bytes = hickory_response(0x1234, "www.example.com.", answers);

    let msg = wire::decode(&bytes).unwrap();
    assert_eq!(msg.header.id, 0x1234);
    assert!(msg.header.is_response());
    assert_eq!(msg.rcode(), ResponseCode::NoError);
    assert_eq!(msg.questions[0].name, "www.example.com");
    assert_eq!(msg.answers.len(), 3);
    assert_eq!(msg.answers[0].data, RecordData::Cname("edge.example.net".into()));
    assert_eq!(msg.answers[1].name, "edge.example.net");
    assert_eq!(msg.answers[1].data, RecordData::A(Ipv4Addr::new(93, 184, 216, 34)));
    assert_eq!(msg.answers[2].data, RecordData::A(Ipv4Addr::new(93, 184, 216, 35)));
}

#[test]
fn test_decode_mx_and_txt_from_hickory() {
    let owner = Name::from_ascii("example.com.").unwrap();
    let answers = vec![
        Record::from_rdata(
            owner.clone(),
            300,
            RData::MX(MX::new(10, Name::from_ascii("mail.example.com.").unwrap())),
        ),
        Record::from_rdata(
            owner,
            300,
            RData::TXT(TXT::new(vec!["v=spf1".to_string(), "-all".to_string()])),
        ),
    ];
    let bytes = hickory_response(7, "example.com.", answers);
    let msg = wire::decode(&bytes).unwrap();

    assert_eq!(
        msg.answers[0].data,
        RecordData::Mx {
            preference: 10,
            exchange: "mail.example.com".into()
        }
    );
    assert_eq!(
        msg.answers[1].data,
        RecordData::Txt(vec![b"v=spf1".to_vec(), b"-all".to_vec()])
    );
}

#[test]
fn test_response_template_round_trip() {
    let q = query("example.com", RecordType::A);
    let template = Message::response_to(&q).with_answer(a("example.com", 300, [93, 184, 216, 34]));

    let bytes = wire::encode_message(&template).unwrap();
    let decoded = wire::decode(&bytes).unwrap();

    assert_eq!(decoded.header.id, q.id);
    assert_eq!(decoded.questions, template.questions);
    assert_eq!(decoded.answers, template.answers);
    assert_eq!(decoded.header.ancount, 1);
}

#[test]
fn test_our_response_parses_with_hickory() {
    let q = query("example.com", RecordType::A);
    let mut request = Message::default();
    request.header.id = q.id;
    request.questions.push(q.question());
    let response = reply(&request, ResponseCode::NxDomain, vec![]);

    let bytes = wire::encode_message(&response).unwrap();
    let parsed = HickoryMessage::from_vec(&bytes).unwrap();
    assert_eq!(parsed.id(), q.id);
    assert_eq!(
        parsed.response_code(),
        hickory_proto::op::ResponseCode::NXDomain
    );
}

#[test]
fn test_three_byte_buffer_is_truncated() {
    assert_eq!(wire::decode(&[0x12, 0x34, 0x81]), Err(DecodeError::Truncated));
}

#[test]
fn test_every_prefix_fails_cleanly() {
    let bytes = hickory_response(
        1,
        "example.com.",
        vec![Record::from_rdata(
            Name::from_ascii("example.com.").unwrap(),
            60,
            RData::A(A(Ipv4Addr::LOCALHOST)),
        )],
    );
    for len in 0..bytes.len() {
        assert!(wire::decode(&bytes[..len]).is_err(), "prefix of {} bytes decoded", len);
    }
    assert!(wire::decode(&bytes).is_ok());
}

#[test]
fn test_header_count_larger_than_sections() {
    let mut bytes = hickory_response(1, "example.com.", vec![]);
    // ANCOUNT = 1 with no answer present.
    bytes[7] = 1;
    assert!(matches!(
        wire::decode(&bytes),
        Err(DecodeError::CountMismatch { .. }) | Err(DecodeError::Truncated)
    ));
}

#[test]
fn test_forward_pointer_rejected() {
    let mut bytes = vec![0x00, 0x01, 0x81, 0x80, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    // Question name is a pointer to itself.
    bytes.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
    assert!(matches!(
        wire::decode(&bytes),
        Err(DecodeError::PointerOutOfBounds { .. }) | Err(DecodeError::PointerLoop { .. })
    ));
}

#[test]
fn test_pointer_running_into_its_own_name() {
    let mut bytes = vec![0x00, 0x01, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
    // Question class 0x0100, so offset 27 reads as a one-byte label.
    bytes.extend_from_slice(b"\x07example\x03com\x00\x00\x01\x01\x00");
    // Answer owner at offset 29 points back to 27, whose label runs into 29.
    bytes.extend_from_slice(b"\xc0\x1b\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x04\x7f\x00\x00\x01");
    assert_eq!(wire::decode(&bytes), Err(DecodeError::PointerLoop { at: 27 }));
}

#[test]
fn test_structured_records_round_trip() {
    let q = query("example.com", RecordType::ANY);
    let records = vec![
        ResourceRecord::new(
            "example.com",
            RecordType::SOA,
            3600,
            RecordData::Soa(SoaData {
                mname: "ns1.example.com".into(),
                rname: "hostmaster.example.com".into(),
                serial: 2024010101,
                refresh: 7200,
                retry: 3600,
                expire: 1209600,
                minimum: 300,
            }),
        ),
        ResourceRecord::new(
            "_sip._udp.example.com",
            RecordType::SRV,
            60,
            RecordData::Srv(SrvData {
                priority: 10,
                weight: 5,
                port: 5060,
                target: "sip.example.com".into(),
            }),
        ),
        ResourceRecord::new(
            "example.com",
            RecordType::NAPTR,
            60,
            RecordData::Naptr(NaptrData {
                order: 100,
                preference: 10,
                flags: b"S".to_vec(),
                services: b"SIP+D2U".to_vec(),
                regexp: Vec::new(),
                replacement: "_sip._udp.example.com".into(),
            }),
        ),
        ResourceRecord::new(
            "_443._tcp.example.com",
            RecordType::TLSA,
            60,
            RecordData::Tlsa(TlsaData {
                cert_usage: 3,
                selector: 1,
                matching_type: 1,
                data: vec![0xab; 32],
            }),
        ),
        ResourceRecord::new(
            "example.com",
            RecordType::CAA,
            60,
            RecordData::Caa(CaaData {
                critical: false,
                tag: "issue".into(),
                value: b"letsencrypt.org".to_vec(),
            }),
        ),
        ResourceRecord::new(
            "example.com",
            RecordType::TXT,
            60,
            RecordData::Txt(vec![b"v=spf1".to_vec(), b"-all".to_vec()]),
        ),
    ];
    let mut template = Message::response_to(&q);
    for record in &records {
        template = template.with_answer(record.clone());
    }

    let decoded = wire::decode(&wire::encode_message(&template).unwrap()).unwrap();
    assert_eq!(decoded.answers, records);
}

#[test]
fn test_soa_from_hickory_sets_negative_ttl() {
    use hickory_proto::rr::rdata::SOA;

    let zone = Name::from_ascii("example.com.").unwrap();
    let mut msg = HickoryMessage::new();
    msg.set_id(9)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_response_code(hickory_proto::op::ResponseCode::NXDomain)
        .add_query(HickoryQuery::query(zone.clone(), HickoryType::A))
        .add_name_server(Record::from_rdata(
            zone.clone(),
            900,
            RData::SOA(SOA::new(
                Name::from_ascii("ns1.example.com.").unwrap(),
                Name::from_ascii("hostmaster.example.com.").unwrap(),
                1,
                7200,
                3600,
                1209600,
                300,
            )),
        ));
    let msg = wire::decode(&msg.to_vec().unwrap()).unwrap();

    assert_eq!(msg.rcode(), ResponseCode::NxDomain);
    assert_eq!(msg.negative_ttl(), Some(300));
}
