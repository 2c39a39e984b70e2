//! Logging setup for the `expectty` binary.
//!
//! Diagnostics go to stderr so they never interleave with the instruction
//! report on stdout. The filter comes from `RUST_LOG` and defaults to `warn`:
//! - `RUST_LOG=debug` shows scenario lifecycle (spawn, stop, exit status)
//! - `RUST_LOG=trace` adds every captured chunk

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
