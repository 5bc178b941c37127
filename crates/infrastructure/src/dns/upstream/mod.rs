//! Talking to upstream servers: one exchange at a time (`query`,
//! `connector`) and the walk across the configured list (`failover`).

pub mod connector;
pub mod failover;
pub mod query;

pub use connector::{NetworkConnector, UpstreamConnector};
pub use failover::{FailoverStrategy, RetryPolicy, UpstreamResult};
pub use query::{query_server, QueryAttemptResult};
