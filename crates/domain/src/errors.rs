use crate::config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Terminal classification of a failed resolution.
///
/// Every failure that reaches the public API is exactly one of these; no
/// partial result is ever returned alongside an error.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed DNS message: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("All upstream servers failed after {attempts} attempt(s), last error: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<DomainError>,
    },

    #[error("No upstream servers configured")]
    NoServers,

    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    /// Whether the resolver core should move on to the next server after this
    /// error. Only input validation and cancellation stop the walk.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Decode(_) | DomainError::Transport(_) | DomainError::Upstream(_)
        )
    }

    pub fn is_nxdomain(&self) -> bool {
        match self {
            DomainError::Upstream(UpstreamError::NxDomain) => true,
            DomainError::Exhausted { last, .. } => last.is_nxdomain(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            DomainError::Transport(TransportError::Timeout { .. }) => true,
            DomainError::Exhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }

    /// Short error code in the style of c-ares / Node's `dns` module.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidInput(_) => "EBADNAME",
            DomainError::Decode(_) => "EBADRESP",
            DomainError::Transport(TransportError::Timeout { .. }) => "ETIMEOUT",
            DomainError::Transport(TransportError::ConnectionRefused { .. }) => "ECONNREFUSED",
            DomainError::Transport(_) => "ECONNREFUSED",
            DomainError::Upstream(UpstreamError::NxDomain) => "ENOTFOUND",
            DomainError::Upstream(UpstreamError::ServFail) => "ESERVFAIL",
            DomainError::Upstream(UpstreamError::Refused) => "EREFUSED",
            DomainError::Upstream(UpstreamError::NotImplemented) => "ENOTIMP",
            DomainError::Upstream(UpstreamError::FormErr) => "EFORMERR",
            DomainError::Upstream(UpstreamError::Other(_)) => "EBADRESP",
            DomainError::Exhausted { last, .. } => last.code(),
            DomainError::NoServers => "ENOSERVERS",
            DomainError::Cancelled => "ECANCELLED",
            DomainError::Config(_) => "EBADCONFIG",
        }
    }
}

impl From<ConfigError> for DomainError {
    fn from(e: ConfigError) -> Self {
        DomainError::Config(e.to_string())
    }
}

/// A wire message could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message truncated")]
    Truncated,

    #[error("{section} count in header is {expected} but message holds {actual}")]
    CountMismatch {
        section: Section,
        expected: u16,
        actual: u16,
    },

    #[error("compression pointer at offset {at} points to {target}, outside the already-read message")]
    PointerOutOfBounds { at: usize, target: usize },

    #[error("compression pointer loop detected at offset {at}")]
    PointerLoop { at: usize },

    #[error("domain name exceeds 255 bytes")]
    NameTooLong,

    #[error("unsupported label type 0x{0:02x}")]
    InvalidLabelType(u8),

    #[error("record data length {declared} does not match parsed length {parsed}")]
    RecordDataLength { declared: usize, parsed: usize },

    #[error("{0} trailing byte(s) after last section")]
    TrailingBytes(usize),

    #[error("message is not a response")]
    NotAResponse,

    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Message sections, used to label count mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Question => "question",
            Section::Answer => "answer",
            Section::Authority => "authority",
            Section::Additional => "additional",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout waiting for {server}")]
    Timeout { server: String },

    #[error("connection refused by {server}")]
    ConnectionRefused { server: String },

    #[error("connection reset by {server}")]
    ConnectionReset { server: String },

    #[error("socket error talking to {server}: {message}")]
    Io { server: String, message: String },

    #[error("TLS error with {server}: {message}")]
    Tls { server: String, message: String },
}

impl TransportError {
    /// Maps an `io::Error` onto the closest transport classification.
    pub fn from_io(server: impl fmt::Display, e: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        let server = server.to_string();
        match e.kind() {
            ErrorKind::ConnectionRefused => TransportError::ConnectionRefused { server },
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                TransportError::ConnectionReset { server }
            }
            ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout { server },
            _ => TransportError::Io {
                server,
                message: e.to_string(),
            },
        }
    }
}

/// Error signalled by the upstream server through the RCODE header field.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("domain not found (NXDOMAIN)")]
    NxDomain,

    #[error("server failure (SERVFAIL)")]
    ServFail,

    #[error("query refused (REFUSED)")]
    Refused,

    #[error("query type not implemented (NOTIMP)")]
    NotImplemented,

    #[error("format error (FORMERR)")]
    FormErr,

    #[error("response code {0}")]
    Other(u8),
}

impl UpstreamError {
    /// Classifies a non-zero RCODE. Returns `None` for NOERROR.
    pub fn from_rcode(rcode: u8) -> Option<Self> {
        match rcode {
            0 => None,
            1 => Some(UpstreamError::FormErr),
            2 => Some(UpstreamError::ServFail),
            3 => Some(UpstreamError::NxDomain),
            4 => Some(UpstreamError::NotImplemented),
            5 => Some(UpstreamError::Refused),
            other => Some(UpstreamError::Other(other)),
        }
    }
}
