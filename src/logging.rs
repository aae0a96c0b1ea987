//! Logging setup
//!
//! Diagnostics go to stderr through `tracing`, so they never mix with the
//! menu and result tables on stdout. `RUST_LOG` selects the level.

use crate::error::{Result, TextToSqlError};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter from a `RUST_LOG`-style value
pub fn env_filter(value: Option<&str>) -> EnvFilter {
    value
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber; fails if one is already installed
pub fn init_logging() -> Result<()> {
    let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| TextToSqlError::Config(format!("Failed to initialize logging: {}", e)))
}
