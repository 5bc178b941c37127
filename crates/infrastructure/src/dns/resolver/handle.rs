use super::cache_layer::CachedResolver;
use super::{AddressTtl, Answer, Family, MxRecord, ResultOrder};
use crate::dns::cache::DnsCache;
use arc_swap::ArcSwap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use stubdns_domain::{
    parse_servers, CachePolicy, CaaData, DnsProtocol, DnsQuery, DomainError, Hostname, NaptrData, RecordData,
    RecordType, ResourceRecord, SoaData, SrvData, TlsaData,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

/// Embeddable stub resolver. Cloning is cheap and clones share the cache,
/// the server list and cancellation.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    cached: CachedResolver,
    cancel: ArcSwap<CancellationToken>,
    _maintenance: Option<DropGuard>,
}

impl Resolver {
    pub(super) fn from_parts(cached: CachedResolver, maintenance: Option<DropGuard>) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                cached,
                cancel: ArcSwap::from_pointee(CancellationToken::new()),
                _maintenance: maintenance,
            }),
        }
    }

    /// Generic typed query. `hostname` must be a valid domain name; IP
    /// literals are rejected here.
    pub async fn query(&self, hostname: &str, record_type: RecordType) -> Result<Answer, DomainError> {
        let name = Hostname::parse(hostname)?;
        self.query_name(name, record_type).await
    }

    async fn query_name(&self, name: Hostname, record_type: RecordType) -> Result<Answer, DomainError> {
        let query = DnsQuery::new(name, record_type);
        self.cancellable(self.inner.cached.resolve(&query)).await
    }

    /// Runs `fut` until it completes or `cancel` is called. Dropping the
    /// future closes whatever socket it had open.
    async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, DomainError>>,
    ) -> Result<T, DomainError> {
        let token = self.inner.cancel.load_full();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(DomainError::Cancelled),
            result = fut => result,
        }
    }

    /// IPv4 addresses of `hostname`, in server order.
    pub async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, DomainError> {
        Ok(self.query(hostname, RecordType::A).await?.addresses())
    }

    pub async fn resolve4(&self, hostname: &str) -> Result<Vec<AddressTtl>, DomainError> {
        Ok(self.query(hostname, RecordType::A).await?.address_ttls())
    }

    pub async fn resolve6(&self, hostname: &str) -> Result<Vec<AddressTtl>, DomainError> {
        Ok(self.query(hostname, RecordType::AAAA).await?.address_ttls())
    }

    /// Address lookup as an HTTP client's name-resolution hook wants it.
    ///
    /// An IP literal is returned as-is when it belongs to `family`, and gives
    /// an empty list otherwise. With `Family::Any` the A and AAAA
    /// queries run concurrently; one family failing is tolerated, and when
    /// both fail the A error is reported.
    pub async fn lookup(
        &self,
        host: &str,
        family: Family,
        order: ResultOrder,
    ) -> Result<Vec<IpAddr>, DomainError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            let wanted = match family {
                Family::Any => true,
                Family::V4 => ip.is_ipv4(),
                Family::V6 => ip.is_ipv6(),
            };
            return Ok(if wanted { vec![ip] } else { Vec::new() });
        }

        match family {
            Family::V4 => self.resolve(host).await,
            Family::V6 => Ok(self.query(host, RecordType::AAAA).await?.addresses()),
            Family::Any => {
                let (v4, v6) = tokio::join!(
                    self.query(host, RecordType::A),
                    self.query(host, RecordType::AAAA)
                );
                let (v4, v6) = match (v4, v6) {
                    (Err(e), Err(_)) => return Err(e),
                    (v4, v6) => (
                        v4.map(|a| a.addresses()).unwrap_or_default(),
                        v6.map(|a| a.addresses()).unwrap_or_default(),
                    ),
                };

                let mut addresses = Vec::with_capacity(v4.len() + v6.len());
                match order {
                    ResultOrder::Verbatim | ResultOrder::Ipv4First => {
                        addresses.extend(v4);
                        addresses.extend(v6);
                    }
                    ResultOrder::Ipv6First => {
                        addresses.extend(v6);
                        addresses.extend(v4);
                    }
                }
                Ok(addresses)
            }
        }
    }

    pub async fn resolve_mx(&self, hostname: &str) -> Result<Vec<MxRecord>, DomainError> {
        let answer = self.query(hostname, RecordType::MX).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Mx {
                preference,
                exchange,
            } => Some(MxRecord {
                priority: preference,
                exchange,
            }),
            _ => None,
        }))
    }

    /// TXT records, one entry per record, each split into its character
    /// strings.
    pub async fn resolve_txt(&self, hostname: &str) -> Result<Vec<Vec<String>>, DomainError> {
        let answer = self.query(hostname, RecordType::TXT).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Txt(chunks) => Some(
                chunks
                    .iter()
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .collect(),
            ),
            _ => None,
        }))
    }

    pub async fn resolve_cname(&self, hostname: &str) -> Result<Vec<String>, DomainError> {
        self.names(hostname, RecordType::CNAME).await
    }

    pub async fn resolve_ns(&self, hostname: &str) -> Result<Vec<String>, DomainError> {
        self.names(hostname, RecordType::NS).await
    }

    pub async fn resolve_ptr(&self, hostname: &str) -> Result<Vec<String>, DomainError> {
        self.names(hostname, RecordType::PTR).await
    }

    pub async fn resolve_soa(&self, hostname: &str) -> Result<Option<SoaData>, DomainError> {
        let answer = self.query(hostname, RecordType::SOA).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Soa(soa) => Some(soa),
            _ => None,
        })
        .into_iter()
        .next())
    }

    pub async fn resolve_srv(&self, hostname: &str) -> Result<Vec<SrvData>, DomainError> {
        let answer = self.query(hostname, RecordType::SRV).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Srv(srv) => Some(srv),
            _ => None,
        }))
    }

    pub async fn resolve_caa(&self, hostname: &str) -> Result<Vec<CaaData>, DomainError> {
        let answer = self.query(hostname, RecordType::CAA).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Caa(caa) => Some(caa),
            _ => None,
        }))
    }

    pub async fn resolve_naptr(&self, hostname: &str) -> Result<Vec<NaptrData>, DomainError> {
        let answer = self.query(hostname, RecordType::NAPTR).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Naptr(naptr) => Some(naptr),
            _ => None,
        }))
    }

    pub async fn resolve_tlsa(&self, hostname: &str) -> Result<Vec<TlsaData>, DomainError> {
        let answer = self.query(hostname, RecordType::TLSA).await?;
        Ok(collect(answer.records, |data| match data {
            RecordData::Tlsa(tlsa) => Some(tlsa),
            _ => None,
        }))
    }

    pub async fn resolve_any(&self, hostname: &str) -> Result<Vec<ResourceRecord>, DomainError> {
        Ok(self.query(hostname, RecordType::ANY).await?.records)
    }

    /// Host names for `ip`, via its `in-addr.arpa` / `ip6.arpa` PTR records.
    pub async fn reverse(&self, ip: IpAddr) -> Result<Vec<String>, DomainError> {
        let answer = self
            .query_name(Hostname::reverse_of(ip), RecordType::PTR)
            .await?;
        Ok(target_names(answer.records))
    }

    async fn names(&self, hostname: &str, record_type: RecordType) -> Result<Vec<String>, DomainError> {
        let answer = self.query(hostname, record_type).await?;
        Ok(target_names(answer.records))
    }

    pub fn servers(&self) -> Vec<DnsProtocol> {
        self.inner.cached.core().servers().as_ref().clone()
    }

    /// Replaces the whole server list. Requests already running keep the list
    /// they started with. An empty list is accepted; resolutions then fail
    /// with `NoServers`.
    pub fn set_servers<S: AsRef<str>>(&self, servers: &[S]) -> Result<(), DomainError> {
        let parsed = parse_servers(servers).map_err(DomainError::InvalidInput)?;
        self.inner.cached.core().set_servers(parsed);
        Ok(())
    }

    /// Fails every in-flight request of this resolver (and its clones) with
    /// `Cancelled`. Later requests are unaffected.
    pub fn cancel(&self) {
        let previous = self
            .inner
            .cancel
            .swap(Arc::new(CancellationToken::new()));
        previous.cancel();
        info!("Cancelled in-flight resolutions");
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = self.inner.cached.cache() {
            cache.clear();
        } else {
            debug!("Cache disabled, nothing to clear");
        }
    }

    pub fn cache(&self) -> Option<&Arc<DnsCache>> {
        self.inner.cached.cache()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.inner.cached.policy()
    }

    /// Applies to requests started after the call. `stale_ttl_secs` is how
    /// long past expiry an entry may still be served under the stale
    /// policies.
    pub fn set_cache_policy(&self, policy: CachePolicy, stale_ttl_secs: u32) {
        self.inner.cached.set_policy(policy, stale_ttl_secs);
    }

    /// Changes the cache capacity, evicting entries when it shrinks. Fails
    /// for zero and when the resolver was built without a cache.
    pub fn set_cache_size(&self, max_entries: usize) -> Result<(), DomainError> {
        if max_entries == 0 {
            return Err(DomainError::InvalidInput(
                "cache size must be greater than 0".to_string(),
            ));
        }
        let cache = self
            .inner
            .cached
            .cache()
            .ok_or_else(|| DomainError::InvalidInput("cache is disabled".to_string()))?;
        cache.set_max_entries(max_entries);
        Ok(())
    }

    /// Source addresses for upstream sockets opened from now on. `None` or an
    /// unspecified address (`0.0.0.0`, `::`) lets the OS choose.
    pub fn set_local_address(&self, v4: Option<Ipv4Addr>, v6: Option<Ipv6Addr>) {
        let v4 = v4.filter(|ip| !ip.is_unspecified());
        let v6 = v6.filter(|ip| !ip.is_unspecified());
        self.inner
            .cached
            .core()
            .connector()
            .set_local_address(v4, v6);
    }
}

fn collect<T>(records: Vec<ResourceRecord>, f: impl FnMut(RecordData) -> Option<T>) -> Vec<T> {
    records.into_iter().map(|rr| rr.data).filter_map(f).collect()
}

fn target_names(records: Vec<ResourceRecord>) -> Vec<String> {
    collect(records, |data| match data {
        RecordData::Ns(name) | RecordData::Cname(name) | RecordData::Ptr(name) => Some(name),
        _ => None,
    })
}
