pub mod blocking;
pub mod json;

pub use blocking::BlockingResolver;
pub use json::{
    address_ttls_json, addresses_json, error_json, record_value, records_json, resolve_json,
};
