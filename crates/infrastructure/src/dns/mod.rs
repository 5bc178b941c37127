pub mod api;
pub mod cache;
pub mod resolver;
pub mod transport;
pub mod upstream;
pub mod wire;

pub use api::BlockingResolver;
pub use cache::{CacheKey, CacheMetrics, CacheStats, DnsCache};
pub use resolver::{Answer, Family, Resolver, ResolverBuilder, ResultOrder};
pub use upstream::{FailoverStrategy, NetworkConnector, RetryPolicy, UpstreamConnector};
