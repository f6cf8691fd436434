//! Log subscriber setup.
//!
//! Events go to stderr so stdout stays clean for `--json` output.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive; wins over the config.
pub const LOG_ENV: &str = "FIRMDEX_LOG";

const DEFAULT_LEVEL: &str = "warn";

/// Filter from `FIRMDEX_LOG`, else from the configured level, else `warn`.
pub fn build_env_filter(config_level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }
    let level = config_level.filter(|level| !level.trim().is_empty()).unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global fmt subscriber.
pub fn init(config_level: Option<&str>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("Failed to install log subscriber: {err}"))
}
