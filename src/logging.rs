//! Diagnostic logging setup.
//!
//! Logs go to stderr through `tracing-subscriber`; user-facing output stays
//! on stdout via [`crate::output::OutputFormatter`]. `RUST_LOG` overrides the
//! configured level.

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// `quiet` lowers the default filter to errors only. Calling this more than
/// once is harmless; later calls keep the first subscriber.
pub fn init(level: &str, quiet: bool) {
    let default_level = if quiet { "error" } else { level };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdfdesk={default_level},{default_level}")));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
