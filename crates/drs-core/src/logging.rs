//! Subscriber installation for binaries and adapters
//!
//! Library code only emits `tracing` events; whoever owns `main` decides
//! where they go by calling [`init`] once.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Fallback filter when `log_level` is not a valid directive
const FALLBACK_FILTER: &str = "info";

/// Install the global subscriber described by `config`
///
/// Writes to stderr so command output on stdout stays machine-readable.
/// Returns `false` when a subscriber was already installed; the existing
/// one is left in place.
pub fn init(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let installed = match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.is_ok()
}
