//! Diagnostic logging.
//!
//! Warnings about skipped records and soft provider failures go through
//! `tracing` to stderr. Level defaults to `info` and follows `RUST_LOG`.

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Calling it twice is an error.
pub fn init() -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
