use compact_str::CompactString;
use stubdns_domain::RecordType;

/// At most one cache entry exists per key. Names are stored lower-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: CompactString,
    pub record_type: RecordType,
}

impl CacheKey {
    #[inline]
    pub fn new(domain: &str, record_type: RecordType) -> Self {
        let domain = if domain.bytes().any(|b| b.is_ascii_uppercase()) {
            CompactString::from(domain.to_ascii_lowercase())
        } else {
            CompactString::from(domain)
        };
        Self {
            domain,
            record_type,
        }
    }
}
