use super::errors::ConfigError;
use crate::dns_protocol::{parse_servers, DnsProtocol};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Classic UDP payload limit without EDNS(0).
pub const CLASSIC_UDP_PAYLOAD: u16 = 512;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Ordered upstream endpoints; the first entry is tried first.
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Timeout of a single attempt against a single server.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Number of passes over the server list.
    #[serde(default = "default_tries")]
    pub tries: u32,

    /// Upper bound for the per-attempt timeout, which doubles on every pass.
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,

    /// UDP payload size advertised through EDNS(0); `None` sends no OPT record
    /// and keeps the classic 512-byte limit.
    #[serde(default = "default_edns_udp_size")]
    pub edns_udp_size: Option<u16>,

    /// Source address for IPv4 upstream sockets.
    #[serde(default)]
    pub local_address_v4: Option<Ipv4Addr>,

    /// Source address for IPv6 upstream sockets.
    #[serde(default)]
    pub local_address_v6: Option<Ipv6Addr>,

    /// Start each request at the next server instead of always the first.
    #[serde(default)]
    pub rotate: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            timeout_ms: default_timeout_ms(),
            tries: default_tries(),
            max_timeout_ms: default_max_timeout_ms(),
            edns_udp_size: default_edns_udp_size(),
            local_address_v4: None,
            local_address_v6: None,
            rotate: false,
        }
    }
}

/// Resolver options as sent by a host application, e.g.
/// `{"servers": ["1.1.1.1"], "timeout": 3000, "tries": 2, "maxTimeout": 10000,
/// "cacheSize": 500}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HostOptions {
    servers: Option<Vec<String>>,
    timeout: Option<i64>,
    #[serde(alias = "attempts")]
    tries: Option<u32>,
    max_timeout: Option<u64>,
    pub(crate) cache_size: Option<usize>,
}

impl HostOptions {
    pub(crate) fn parse(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlays the resolver options onto `config`. A timeout of `-1`
    /// selects the default.
    pub(crate) fn apply(&self, config: &mut ResolverConfig) -> Result<(), ConfigError> {
        if let Some(servers) = &self.servers {
            config.servers = servers.clone();
        }
        match self.timeout {
            None | Some(-1) => {}
            Some(ms) if ms > 0 => config.timeout_ms = ms as u64,
            Some(ms) => {
                return Err(ConfigError::Validation(format!(
                    "timeout must be -1 or positive, got {}",
                    ms
                )))
            }
        }
        if let Some(tries) = self.tries {
            config.tries = tries;
        }
        if let Some(max) = self.max_timeout {
            config.max_timeout_ms = max;
        }
        config.max_timeout_ms = config.max_timeout_ms.max(config.timeout_ms);
        Ok(())
    }
}

impl ResolverConfig {
    /// Builds a config from the host-side JSON options, keeping defaults for
    /// anything missing. Cache options are ignored here; see
    /// `Config::from_json`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        HostOptions::parse(json)?.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn endpoints(&self) -> Result<Vec<DnsProtocol>, ConfigError> {
        parse_servers(&self.servers).map_err(ConfigError::Validation)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_timeout(&self) -> Duration {
        Duration::from_millis(self.max_timeout_ms)
    }

    /// Largest response we are prepared to receive over UDP.
    pub fn udp_payload_size(&self) -> u16 {
        self.edns_udp_size
            .map(|size| size.max(CLASSIC_UDP_PAYLOAD))
            .unwrap_or(CLASSIC_UDP_PAYLOAD)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }
        self.endpoints()?;

        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.tries == 0 {
            return Err(ConfigError::Validation(
                "tries must be greater than 0".to_string(),
            ));
        }
        if self.max_timeout_ms < self.timeout_ms {
            return Err(ConfigError::Validation(format!(
                "max_timeout_ms ({}) is lower than timeout_ms ({})",
                self.max_timeout_ms, self.timeout_ms
            )));
        }
        Ok(())
    }
}

fn default_servers() -> Vec<String> {
    vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()]
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_tries() -> u32 {
    1
}

fn default_max_timeout_ms() -> u64 {
    8000
}

fn default_edns_udp_size() -> Option<u16> {
    Some(1232)
}
