pub mod clock;
pub mod entry;
pub mod key;
pub mod maintenance;
pub mod metrics;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheHit};
pub use key::CacheKey;
pub use maintenance::spawn_eviction_task;
pub use metrics::{CacheMetrics, CacheStats};
pub use storage::DnsCache;
