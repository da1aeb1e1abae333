//! Tracing subscriber setup for the binary
//!
//! Quiet by default (`warn`). Debug mode raises the level to `info`, and a
//! non-empty `RUST_LOG` replaces both.

use tracing_subscriber::EnvFilter;

use crate::error::{AarogyaError, Result};

/// Default filter directive for the given mode
#[must_use]
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "info"
    } else {
        "warn"
    }
}

/// Build the filter from an optional `RUST_LOG` value
///
/// # Errors
///
/// Returns [`AarogyaError::InvalidConfiguration`] if the directives do not
/// parse.
pub fn build_filter(debug: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
    let directives = rust_log
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| default_directive(debug));
    EnvFilter::try_new(directives).map_err(|e| {
        AarogyaError::InvalidConfiguration(format!("Invalid log filter '{directives}': {e}"))
    })
}

/// Install the global fmt subscriber
///
/// # Errors
///
/// Fails on an invalid `RUST_LOG` or if a subscriber is already installed.
pub fn init(debug: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(debug, rust_log.as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| AarogyaError::InvalidConfiguration(format!("Failed to init logging: {e}")))
}
