//! Structured logging setup: a `fmt` layer over stderr gated by
//! `RUST_LOG`, initialized once at process start.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. Safe to call more than
/// once in tests; later calls are no-ops if a subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
