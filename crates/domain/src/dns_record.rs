pub mod rdata;
pub mod record;
pub mod record_type;

pub use rdata::{CaaData, NaptrData, RecordData, SoaData, SrvData, TlsaData};
pub use record::ResourceRecord;
pub use record_type::RecordType;
