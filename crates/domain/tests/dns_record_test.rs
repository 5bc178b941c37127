use stubdns_domain::{RecordData, RecordType, SrvData};
use std::net::IpAddr;
use std::str::FromStr;

mod helpers;
use helpers::ResourceRecordBuilder;

#[test]
fn test_record_expiration() {
    let record = ResourceRecordBuilder::new().ttl(300).build();

    assert!(!record.is_expired(100));
    assert!(!record.is_expired(299));
    assert!(record.is_expired(300));
    assert!(record.is_expired(500));
}

#[test]
fn test_remaining_ttl() {
    let record = ResourceRecordBuilder::new().ttl(300).build();

    assert_eq!(record.remaining_ttl(0), 300);
    assert_eq!(record.remaining_ttl(100), 200);
    assert_eq!(record.remaining_ttl(300), 0);
    assert_eq!(record.remaining_ttl(500), 0);
}

#[test]
fn test_record_type_and_address() {
    let v4 = ResourceRecordBuilder::new().address("192.0.2.1").build();
    assert_eq!(v4.record_type(), Some(RecordType::A));
    assert_eq!(v4.ip_addr(), Some(IpAddr::from_str("192.0.2.1").unwrap()));

    let v6 = ResourceRecordBuilder::new().address("2001:db8::1").build();
    assert_eq!(v6.record_type(), Some(RecordType::AAAA));
    assert_eq!(v6.ip_addr(), Some(IpAddr::from_str("2001:db8::1").unwrap()));
}

#[test]
fn test_non_address_record_has_no_ip() {
    let record = ResourceRecordBuilder::new()
        .data(RecordData::Srv(SrvData {
            priority: 10,
            weight: 5,
            port: 5060,
            target: "sip.example.com".into(),
        }))
        .build();

    assert_eq!(record.record_type(), Some(RecordType::SRV));
    assert_eq!(record.ip_addr(), None);
    assert_eq!(record.data.target_name(), Some("sip.example.com"));
}

#[test]
fn test_record_type_codes() {
    for rt in [
        RecordType::A,
        RecordType::NS,
        RecordType::CNAME,
        RecordType::SOA,
        RecordType::PTR,
        RecordType::MX,
        RecordType::TXT,
        RecordType::AAAA,
        RecordType::SRV,
        RecordType::NAPTR,
        RecordType::TLSA,
        RecordType::CAA,
        RecordType::ANY,
    ] {
        assert_eq!(RecordType::from_u16(rt.to_u16()), Some(rt));
        assert_eq!(RecordType::from_str(rt.as_str()).unwrap(), rt);
    }
    assert_eq!(RecordType::from_u16(99), None);
}

#[test]
fn test_record_type_from_str_is_case_insensitive() {
    assert_eq!(RecordType::from_str("aaaa").unwrap(), RecordType::AAAA);
    assert!(RecordType::from_str("BOGUS").is_err());
}

#[test]
fn test_any_matches_everything_but_opt() {
    assert!(RecordType::ANY.matches(1));
    assert!(RecordType::ANY.matches(257));
    assert!(!RecordType::ANY.matches(41));
    assert!(RecordType::MX.matches(15));
    assert!(!RecordType::MX.matches(16));
}
