//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins over the level passed on the command line. Output goes to
//! stderr so stdout stays clean for command results.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init_logging(log_level: &str) {
    let filter = build_filter(log_level);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
