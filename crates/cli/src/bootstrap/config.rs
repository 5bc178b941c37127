use anyhow::Context;
use stubdns_domain::{CliOverrides, Config};

/// Runs before logging is set up, so failures are only reported through the
/// returned error.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    Config::load(path, overrides).context("Failed to load configuration")
}
