//! Tracing setup for the fitxp binaries.
//!
//! Command output goes to stdout, so diagnostics always go to stderr.
//! `RUST_LOG` wins over the verbosity flag when set.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directive for a `-v` count: 0 is warn, 1 info, 2 or more debug
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Initialize logging for a `-v` count.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_with_verbosity(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("fitxp_core=debug"))
        .try_init();
}
