//! Logging setup for hosts embedding crossize

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,crossize_core=info,crossize_client=info";

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`
///
/// Returns `false` if a global subscriber was already installed, so repeated
/// calls are harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
