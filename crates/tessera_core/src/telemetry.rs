//! Tracing subscriber bootstrap.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Filtering is controlled through `RUST_LOG` (default: `info`). Safe to
/// call more than once; subsequent calls are no-ops.
pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
