//! Tracing setup for the harness binary.
//!
//! Logs go to stderr so stdout stays free for command output. Scenario
//! results are persisted separately by [`crate::io::report_store`] and do
//! not depend on `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, falling back to `default_level` when unset or invalid.
///
/// # Example
/// ```bash
/// RUST_LOG=harness=debug harness run --distro-name Ubuntu-Preview
/// ```
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
