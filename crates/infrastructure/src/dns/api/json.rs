//! JSON shapes handed across the binding boundary.
//!
//! Address lists are plain string arrays (`"[]"` when empty). Other record
//! types follow the object shapes of Node's `dns` module so host code can
//! pass them through unchanged.

use crate::dns::resolver::{AddressTtl, Resolver};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::net::IpAddr;
use stubdns_domain::{DomainError, RecordData, RecordType, ResourceRecord};

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error_body_json(&ErrorBody {
            code: "EBADRESP",
            message: e.to_string(),
        })
    })
}

fn error_body_json(body: &ErrorBody<'_>) -> String {
    json!({ "code": body.code, "message": body.message }).to_string()
}

pub fn addresses_json(addresses: &[IpAddr]) -> String {
    to_json(addresses)
}

pub fn address_ttls_json(addresses: &[AddressTtl]) -> String {
    to_json(addresses)
}

/// `{"code": "ENOTFOUND", "message": "..."}`
pub fn error_json(error: &DomainError) -> String {
    error_body_json(&ErrorBody {
        code: error.code(),
        message: error.to_string(),
    })
}

/// Records of one query type in their Node shape.
///
/// SOA yields a single object (or `null`), as `resolveSoa` does. ANY tags
/// every entry with its `type`.
pub fn records_json(record_type: RecordType, records: &[ResourceRecord]) -> String {
    if record_type == RecordType::SOA {
        let soa = records.iter().find_map(|rr| record_value(rr, false));
        return soa.unwrap_or(Value::Null).to_string();
    }

    let tagged = record_type == RecordType::ANY;
    let values: Vec<Value> = records
        .iter()
        .filter_map(|rr| record_value(rr, tagged))
        .collect();
    Value::Array(values).to_string()
}

/// One record as a JSON value; `None` for OPT pseudo-records.
pub fn record_value(rr: &ResourceRecord, tagged: bool) -> Option<Value> {
    let mut value = match &rr.data {
        RecordData::A(_) | RecordData::Aaaa(_) if tagged => {
            json!({ "address": rr.ip_addr()?.to_string(), "ttl": rr.ttl })
        }
        RecordData::A(v4) => json!(v4.to_string()),
        RecordData::Aaaa(v6) => json!(v6.to_string()),
        RecordData::Ns(name) | RecordData::Cname(name) | RecordData::Ptr(name) if tagged => {
            json!({ "value": name })
        }
        RecordData::Ns(name) | RecordData::Cname(name) | RecordData::Ptr(name) => json!(name),
        RecordData::Mx {
            preference,
            exchange,
        } => json!({ "exchange": exchange, "priority": preference }),
        RecordData::Txt(chunks) => {
            let entries: Vec<String> = chunks
                .iter()
                .map(|c| String::from_utf8_lossy(c).into_owned())
                .collect();
            if tagged {
                json!({ "entries": entries })
            } else {
                json!(entries)
            }
        }
        RecordData::Soa(soa) => json!({
            "nsname": soa.mname,
            "hostmaster": soa.rname,
            "serial": soa.serial,
            "refresh": soa.refresh,
            "retry": soa.retry,
            "expire": soa.expire,
            "minttl": soa.minimum,
        }),
        RecordData::Srv(srv) => json!({
            "name": srv.target,
            "port": srv.port,
            "priority": srv.priority,
            "weight": srv.weight,
        }),
        RecordData::Naptr(naptr) => json!({
            "flags": String::from_utf8_lossy(&naptr.flags),
            "service": String::from_utf8_lossy(&naptr.services),
            "regexp": String::from_utf8_lossy(&naptr.regexp),
            "replacement": naptr.replacement,
            "order": naptr.order,
            "preference": naptr.preference,
        }),
        RecordData::Tlsa(tlsa) => json!({
            "certUsage": tlsa.cert_usage,
            "selector": tlsa.selector,
            "match": tlsa.matching_type,
            "data": hex(&tlsa.data),
        }),
        RecordData::Caa(caa) => {
            let mut object = Map::new();
            object.insert("critical".into(), json!(if caa.critical { 128 } else { 0 }));
            object.insert(caa.tag.clone(), json!(String::from_utf8_lossy(&caa.value)));
            Value::Object(object)
        }
        RecordData::Opt(_) => return None,
        RecordData::Unknown(bytes) => json!({ "data": hex(bytes) }),
    };

    if tagged {
        if let Value::Object(object) = &mut value {
            object.insert("type".into(), json!(type_name(rr.rtype)));
        }
    }
    Some(value)
}

fn type_name(code: u16) -> String {
    RecordType::from_u16(code)
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| format!("TYPE{}", code))
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        })
}

/// `resolve` rendered as a JSON address array. Failures stay typed; render
/// them with [`error_json`] where the host wants an error object.
pub async fn resolve_json(resolver: &Resolver, hostname: &str) -> Result<String, DomainError> {
    resolver
        .resolve(hostname)
        .await
        .map(|addresses| addresses_json(&addresses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use stubdns_domain::{CaaData, SoaData, SrvData};

    #[test]
    fn test_empty_address_list() {
        assert_eq!(addresses_json(&[]), "[]");
    }

    #[test]
    fn test_address_list_keeps_order() {
        let addrs = [
            IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ];
        assert_eq!(addresses_json(&addrs), r#"["93.184.216.34","::1"]"#);
    }

    #[test]
    fn test_address_ttls() {
        let addrs = [AddressTtl {
            address: IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)),
            ttl: 60,
        }];
        assert_eq!(address_ttls_json(&addrs), r#"[{"address":"1.2.3.4","ttl":60}]"#);
    }

    #[test]
    fn test_error_shape() {
        let value: Value = serde_json::from_str(&error_json(&DomainError::Cancelled)).unwrap();
        assert_eq!(value["code"], "ECANCELLED");
        assert_eq!(value["message"], "Resolution cancelled");
    }

    #[test]
    fn test_mx_and_srv_shapes() {
        let mx = ResourceRecord::new(
            "example.com",
            RecordType::MX,
            300,
            RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com".into(),
            },
        );
        let value: Value = serde_json::from_str(&records_json(RecordType::MX, &[mx])).unwrap();
        assert_eq!(value, json!([{ "exchange": "mail.example.com", "priority": 10 }]));

        let srv = ResourceRecord::new(
            "_sip._tcp.example.com",
            RecordType::SRV,
            300,
            RecordData::Srv(SrvData {
                priority: 1,
                weight: 5,
                port: 5060,
                target: "sip.example.com".into(),
            }),
        );
        let value: Value = serde_json::from_str(&records_json(RecordType::SRV, &[srv])).unwrap();
        assert_eq!(
            value,
            json!([{ "name": "sip.example.com", "port": 5060, "priority": 1, "weight": 5 }])
        );
    }

    #[test]
    fn test_soa_is_single_object() {
        let soa = ResourceRecord::new(
            "example.com",
            RecordType::SOA,
            3600,
            RecordData::Soa(SoaData {
                mname: "ns.example.com".into(),
                rname: "root.example.com".into(),
                serial: 2024010101,
                refresh: 7200,
                retry: 3600,
                expire: 1_209_600,
                minimum: 300,
            }),
        );
        let value: Value = serde_json::from_str(&records_json(RecordType::SOA, &[soa])).unwrap();
        assert_eq!(value["nsname"], "ns.example.com");
        assert_eq!(value["minttl"], 300);
        assert_eq!(records_json(RecordType::SOA, &[]), "null");
    }

    #[test]
    fn test_caa_uses_tag_as_key() {
        let caa = ResourceRecord::new(
            "example.com",
            RecordType::CAA,
            300,
            RecordData::Caa(CaaData {
                critical: false,
                tag: "issue".into(),
                value: b"letsencrypt.org".to_vec(),
            }),
        );
        let value: Value = serde_json::from_str(&records_json(RecordType::CAA, &[caa])).unwrap();
        assert_eq!(value, json!([{ "critical": 0, "issue": "letsencrypt.org" }]));
    }

    #[test]
    fn test_any_entries_are_tagged() {
        let records = [
            ResourceRecord::new("example.com", RecordType::A, 60, RecordData::A(Ipv4Addr::LOCALHOST)),
            ResourceRecord::new(
                "example.com",
                RecordType::TXT,
                60,
                RecordData::Txt(vec![b"v=spf1 -all".to_vec()]),
            ),
        ];
        let value: Value = serde_json::from_str(&records_json(RecordType::ANY, &records)).unwrap();
        assert_eq!(value[0], json!({ "address": "127.0.0.1", "ttl": 60, "type": "A" }));
        assert_eq!(value[1], json!({ "entries": ["v=spf1 -all"], "type": "TXT" }));
    }
}
