//! Tracing setup for binaries embedding the library.
//!
//! The library itself only emits; installing a subscriber is the host's
//! call. These helpers cover the common cases: honor `RUST_LOG` with a
//! fallback, or force an explicit filter (as the CLI does with the
//! `[logging]` filter from the config file).

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber, reading the filter from `RUST_LOG` and
/// falling back to `default_filter` when the variable is unset or invalid.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_from_env(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Install a global fmt subscriber with an explicit filter, ignoring the
/// environment. Safe to call more than once; later calls are no-ops.
pub fn init_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .try_init();
}
