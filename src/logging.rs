//! Diagnostic logging setup for the binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DebugLevel;

/// Filter directive for a debug level. `RUST_LOG` takes precedence when set.
pub fn default_filter(level: DebugLevel) -> &'static str {
    match level {
        DebugLevel::Off => "remembrance=warn",
        DebugLevel::On => "remembrance=debug",
        DebugLevel::Verbose => "remembrance=trace",
    }
}

/// Initialize tracing with output on stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: DebugLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}
