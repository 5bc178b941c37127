use super::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// How the resolver uses cached answers.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Serve entries until their TTL runs out.
    #[default]
    FollowDnsTtl,

    /// Never read or write the cache.
    Bypass,

    /// Serve an entry that expired less than `stale_ttl_secs` ago and refresh
    /// it in the background.
    StaleWhileRevalidate,

    /// Serve an entry that expired less than `stale_ttl_secs` ago only when
    /// every upstream attempt failed.
    StaleIfError,
}

impl CachePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FollowDnsTtl => "follow_dns_ttl",
            Self::Bypass => "bypass",
            Self::StaleWhileRevalidate => "stale_while_revalidate",
            Self::StaleIfError => "stale_if_error",
        }
    }

    /// Numeric encoding used by host bindings (0..=3).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::FollowDnsTtl),
            1 => Some(Self::Bypass),
            2 => Some(Self::StaleWhileRevalidate),
            3 => Some(Self::StaleIfError),
            _ => None,
        }
    }

    pub fn uses_stale(&self) -> bool {
        matches!(self, Self::StaleWhileRevalidate | Self::StaleIfError)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default)]
    pub policy: CachePolicy,

    /// How long past expiry an entry may still be served under the stale
    /// policies.
    #[serde(default = "default_stale_ttl_secs")]
    pub stale_ttl_secs: u32,

    /// TTLs below this are raised to it before caching.
    #[serde(default)]
    pub min_ttl_secs: u32,

    /// TTLs above this are lowered to it before caching.
    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u32,

    /// Entries expired for longer than this are dropped by the eviction pass.
    #[serde(default = "default_eviction_grace_secs")]
    pub eviction_grace_secs: u64,

    /// Period of the background eviction pass; 0 disables it.
    #[serde(default)]
    pub eviction_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            policy: CachePolicy::default(),
            stale_ttl_secs: default_stale_ttl_secs(),
            min_ttl_secs: 0,
            max_ttl_secs: default_max_ttl_secs(),
            eviction_grace_secs: default_eviction_grace_secs(),
            eviction_interval_secs: 0,
        }
    }
}

impl CacheConfig {
    pub fn clamp_ttl(&self, ttl: u32) -> u32 {
        ttl.clamp(self.min_ttl_secs, self.max_ttl_secs)
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.policy != CachePolicy::Bypass
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache max_entries must be greater than 0".to_string(),
            ));
        }
        if self.min_ttl_secs > self.max_ttl_secs {
            return Err(ConfigError::Validation(format!(
                "cache min_ttl_secs ({}) exceeds max_ttl_secs ({})",
                self.min_ttl_secs, self.max_ttl_secs
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    1000
}

fn default_stale_ttl_secs() -> u32 {
    30
}

fn default_max_ttl_secs() -> u32 {
    86_400
}

fn default_eviction_grace_secs() -> u64 {
    60
}
