//! Tracing setup for the binary and tests

use tracing::Level;

use crate::errors::{ContentError, ContentResult};

pub fn parse_level(level: &str) -> ContentResult<Level> {
    level
        .trim()
        .parse::<Level>()
        .map_err(|_| ContentError::config(format!("unknown log level '{level}'")))
}

/// Install the global fmt subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level: &str) -> ContentResult<()> {
    let level = parse_level(level)?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    Ok(())
}
