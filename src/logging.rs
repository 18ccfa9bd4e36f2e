//! Subscriber setup for binaries and demos
//!
//! The library only emits `tracing` events. Applications that want them on
//! stderr call [`init_logging`] once at startup.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"trueno_seq=info"`) when the variable is unset
/// or invalid.
///
/// Returns `false` if a global subscriber was already installed; calling it
/// twice is harmless.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
