//! Structured logging setup using `tracing-subscriber`.
//!
//! Console-only: subcommands are one-shot, so human-readable output goes
//! to stderr, controlled by `RUST_LOG` (default: `info`).

use tracing_subscriber::EnvFilter;

/// Initialise stderr logging for CLI runs.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
