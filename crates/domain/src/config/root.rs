use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::{HostOptions, ResolverConfig};

/// Main configuration structure for stubdns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Upstream servers, timeouts and retry policy
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Answer cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. stubdns.toml in current directory
    /// 3. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("stubdns.toml").exists() {
            Self::from_file("stubdns.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Builds a config from the host-side JSON options (see
    /// `ResolverConfig::from_json`), plus `cacheSize`: the cache capacity in
    /// entries, `0` disabling the cache.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options = HostOptions::parse(json)?;
        let mut config = Self::default();
        options.apply(&mut config.resolver)?;
        match options.cache_size {
            Some(0) => config.cache.enabled = false,
            Some(size) => config.cache.max_entries = size,
            None => {}
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(servers) = overrides.servers {
            if !servers.is_empty() {
                self.resolver.servers = servers;
            }
        }
        if let Some(timeout) = overrides.timeout_ms {
            self.resolver.timeout_ms = timeout;
            self.resolver.max_timeout_ms = self.resolver.max_timeout_ms.max(timeout);
        }
        if let Some(tries) = overrides.tries {
            self.resolver.tries = tries;
        }
        if overrides.no_cache {
            self.cache.enabled = false;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub servers: Option<Vec<String>>,
    pub timeout_ms: Option<u64>,
    pub tries: Option<u32>,
    pub no_cache: bool,
    pub log_level: Option<String>,
}
