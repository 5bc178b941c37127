//! Conversions between resolver types and `hickory-proto` types.

use hickory_proto::rr::rdata::tlsa::{CertUsage, Matching, Selector};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NAPTR, NS, NULL, PTR, SOA, SRV, TLSA, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType as HickoryRecordType};
use stubdns_domain::{
    CaaData, DomainError, NaptrData, RecordData, RecordType, ResourceRecord, SoaData, SrvData,
    TlsaData,
};

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    #[inline]
    pub fn to_hickory(code: u16) -> HickoryRecordType {
        HickoryRecordType::from(code)
    }

    #[inline]
    pub fn from_hickory(record_type: HickoryRecordType) -> u16 {
        u16::from(record_type)
    }
}

/// Parses a presentation name into a fully qualified `Name`. The empty string
/// and "." are the root.
pub fn to_name(name: &str) -> Result<Name, DomainError> {
    if name.is_empty() || name == "." {
        return Ok(Name::root());
    }
    let mut parsed = Name::from_ascii(name)
        .map_err(|e| DomainError::InvalidInput(format!("invalid name '{}': {}", name, e)))?;
    parsed.set_fqdn(true);
    Ok(parsed)
}

/// Lower-cased presentation form without the trailing dot; the root is "".
pub fn name_string(name: &Name) -> String {
    if name.is_root() {
        return String::new();
    }
    let mut ascii = name.to_lowercase().to_ascii();
    if ascii.ends_with('.') {
        ascii.pop();
    }
    ascii
}

/// Maps decoded hickory record data onto [`RecordData`].
///
/// `raw` is the record's rdata exactly as it appeared on the wire; it backs
/// the types carried as bytes (CAA value, OPT, anything unrecognised).
pub fn record_data(rtype: u16, data: Option<&RData>, raw: &[u8]) -> RecordData {
    let Some(data) = data else {
        return match RecordType::from_u16(rtype) {
            Some(RecordType::TXT) => RecordData::Txt(Vec::new()),
            Some(RecordType::OPT) => RecordData::Opt(Vec::new()),
            _ => RecordData::Unknown(Vec::new()),
        };
    };

    match data {
        RData::A(a) => RecordData::A(a.0),
        RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
        RData::NS(ns) => RecordData::Ns(name_string(&ns.0)),
        RData::CNAME(cname) => RecordData::Cname(name_string(&cname.0)),
        RData::PTR(ptr) => RecordData::Ptr(name_string(&ptr.0)),
        RData::MX(mx) => RecordData::Mx {
            preference: mx.preference(),
            exchange: name_string(mx.exchange()),
        },
        RData::TXT(txt) => RecordData::Txt(txt.txt_data().iter().map(|c| c.to_vec()).collect()),
        RData::SOA(soa) => RecordData::Soa(SoaData {
            mname: name_string(soa.mname()),
            rname: name_string(soa.rname()),
            serial: soa.serial(),
            refresh: soa.refresh() as u32,
            retry: soa.retry() as u32,
            expire: soa.expire() as u32,
            minimum: soa.minimum(),
        }),
        RData::SRV(srv) => RecordData::Srv(SrvData {
            priority: srv.priority(),
            weight: srv.weight(),
            port: srv.port(),
            target: name_string(srv.target()),
        }),
        RData::NAPTR(naptr) => RecordData::Naptr(NaptrData {
            order: naptr.order(),
            preference: naptr.preference(),
            flags: naptr.flags().to_vec(),
            services: naptr.services().to_vec(),
            regexp: naptr.regexp().to_vec(),
            replacement: name_string(naptr.replacement()),
        }),
        RData::TLSA(tlsa) => RecordData::Tlsa(TlsaData {
            cert_usage: tlsa.cert_usage().into(),
            selector: tlsa.selector().into(),
            matching_type: tlsa.matching().into(),
            data: tlsa.cert_data().to_vec(),
        }),
        RData::CAA(_) => caa_from_raw(raw),
        _ if rtype == RecordType::OPT.to_u16() => RecordData::Opt(raw.to_vec()),
        _ => RecordData::Unknown(raw.to_vec()),
    }
}

// flags(1) tag-length(1) tag value
fn caa_from_raw(raw: &[u8]) -> RecordData {
    match raw {
        [flags, tag_len, rest @ ..] if rest.len() >= *tag_len as usize => {
            let (tag, value) = rest.split_at(*tag_len as usize);
            RecordData::Caa(CaaData {
                critical: flags & 0x80 != 0,
                tag: String::from_utf8_lossy(tag).to_ascii_lowercase(),
                value: value.to_vec(),
            })
        }
        _ => RecordData::Unknown(raw.to_vec()),
    }
}

/// Builds the hickory record for `rr`. The type code and class are taken
/// from `rr` as-is, so OPT records keep their payload size.
pub fn to_record(rr: &ResourceRecord) -> Result<Record, DomainError> {
    let mut record = Record::with(
        to_name(&rr.name)?,
        RecordTypeMapper::to_hickory(rr.rtype),
        rr.ttl,
    );
    record
        .set_dns_class(DNSClass::from(rr.class))
        .set_data(to_rdata(rr.rtype, &rr.data)?);
    Ok(record)
}

fn to_rdata(rtype: u16, data: &RecordData) -> Result<Option<RData>, DomainError> {
    let rdata = match data {
        RecordData::A(v4) => RData::A(A(*v4)),
        RecordData::Aaaa(v6) => RData::AAAA(AAAA(*v6)),
        RecordData::Ns(name) => RData::NS(NS(to_name(name)?)),
        RecordData::Cname(name) => RData::CNAME(CNAME(to_name(name)?)),
        RecordData::Ptr(name) => RData::PTR(PTR(to_name(name)?)),
        RecordData::Mx {
            preference,
            exchange,
        } => RData::MX(MX::new(*preference, to_name(exchange)?)),
        RecordData::Txt(chunks) if chunks.is_empty() => return Ok(None),
        RecordData::Txt(chunks) => {
            RData::TXT(TXT::from_bytes(chunks.iter().map(Vec::as_slice).collect()))
        }
        RecordData::Soa(soa) => RData::SOA(SOA::new(
            to_name(&soa.mname)?,
            to_name(&soa.rname)?,
            soa.serial,
            soa.refresh as i32,
            soa.retry as i32,
            soa.expire as i32,
            soa.minimum,
        )),
        RecordData::Srv(srv) => RData::SRV(SRV::new(
            srv.priority,
            srv.weight,
            srv.port,
            to_name(&srv.target)?,
        )),
        RecordData::Naptr(naptr) => RData::NAPTR(NAPTR::new(
            naptr.order,
            naptr.preference,
            naptr.flags.clone().into_boxed_slice(),
            naptr.services.clone().into_boxed_slice(),
            naptr.regexp.clone().into_boxed_slice(),
            to_name(&naptr.replacement)?,
        )),
        RecordData::Tlsa(tlsa) => RData::TLSA(TLSA::new(
            CertUsage::from(tlsa.cert_usage),
            Selector::from(tlsa.selector),
            Matching::from(tlsa.matching_type),
            tlsa.data.clone(),
        )),
        RecordData::Caa(caa) => {
            let tag_len = u8::try_from(caa.tag.len()).map_err(|_| {
                DomainError::InvalidInput(format!("CAA tag of {} bytes exceeds 255", caa.tag.len()))
            })?;
            let mut raw = Vec::with_capacity(2 + caa.tag.len() + caa.value.len());
            raw.push(if caa.critical { 0x80 } else { 0 });
            raw.push(tag_len);
            raw.extend_from_slice(caa.tag.as_bytes());
            raw.extend_from_slice(&caa.value);
            raw_rdata(rtype, raw)
        }
        RecordData::Opt(raw) | RecordData::Unknown(raw) if raw.is_empty() => return Ok(None),
        RecordData::Opt(raw) | RecordData::Unknown(raw) => raw_rdata(rtype, raw.clone()),
    };
    Ok(Some(rdata))
}

fn raw_rdata(rtype: u16, raw: Vec<u8>) -> RData {
    RData::Unknown {
        code: RecordTypeMapper::to_hickory(rtype),
        rdata: NULL::with(raw),
    }
}
