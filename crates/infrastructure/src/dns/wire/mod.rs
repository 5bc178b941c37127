//! DNS wire format (RFC 1035 §4), backed by `hickory-proto`.
//!
//! Pure transforms between [`Query`] / [`Message`] values and bytes. Nothing
//! here touches sockets or clocks.

pub mod convert;
pub mod decode;
pub mod encode;
pub mod fast_path;
pub mod header;
pub mod message;
pub mod query;

pub use decode::decode;
pub use encode::{encode_message, encode_query};
pub use fast_path::response_matches;
pub use header::{Header, ResponseCode, HEADER_LEN};
pub use message::{Message, Question};
pub use query::Query;

/// Largest DNS message over UDP without EDNS(0).
pub const CLASSIC_UDP_LIMIT: usize = 512;

/// Reads the TC bit without decoding the rest of the message.
pub fn is_truncated(bytes: &[u8]) -> bool {
    Header::read(bytes).is_some_and(|h| h.is_truncated())
}
