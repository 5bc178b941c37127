use crate::errors::DomainError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum length of a domain name in presentation form (without the root dot).
pub const MAX_NAME_LEN: usize = 253;
/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

/// A syntactically valid, lower-cased domain name without the trailing dot.
///
/// Labels are 1..=63 bytes of ASCII letters, digits, `-` and `_`, and may not
/// start or end with `-`. Non-ASCII input must be converted to its A-label
/// form by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(Arc<str>);

impl Hostname {
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.strip_suffix('.').unwrap_or(input);

        if trimmed.is_empty() {
            return Err(DomainError::InvalidInput("empty hostname".to_string()));
        }
        if trimmed.parse::<IpAddr>().is_ok() {
            return Err(DomainError::InvalidInput(format!(
                "'{}' is an IP address, not a hostname",
                input
            )));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(DomainError::InvalidInput(format!(
                "hostname exceeds {} characters",
                MAX_NAME_LEN
            )));
        }

        for label in trimmed.split('.') {
            validate_label(label, input)?;
        }

        Ok(Self(trimmed.to_ascii_lowercase().into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_arc(&self) -> &Arc<str> {
        &self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The `in-addr.arpa` / `ip6.arpa` name used for reverse lookups.
    pub fn reverse_of(ip: IpAddr) -> Self {
        let name = match ip {
            IpAddr::V4(v4) => {
                let o = v4.octets();
                format!("{}.{}.{}.{}.in-addr.arpa", o[3], o[2], o[1], o[0])
            }
            IpAddr::V6(v6) => {
                let mut name = String::with_capacity(72);
                for byte in v6.octets().iter().rev() {
                    name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
                }
                name.push_str("ip6.arpa");
                name
            }
        };
        Self(name.into())
    }
}

fn validate_label(label: &str, input: &str) -> Result<(), DomainError> {
    if label.is_empty() {
        return Err(DomainError::InvalidInput(format!(
            "empty label in '{}'",
            input
        )));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(DomainError::InvalidInput(format!(
            "label '{}' exceeds {} characters",
            label, MAX_LABEL_LEN
        )));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(DomainError::InvalidInput(format!(
            "label '{}' starts or ends with a hyphen",
            label
        )));
    }
    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(DomainError::InvalidInput(format!(
            "invalid character {:?} in '{}'",
            c, input
        )));
    }
    Ok(())
}

impl FromStr for Hostname {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hostname::parse(s)
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
