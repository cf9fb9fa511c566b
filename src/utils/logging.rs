//! Structured logging setup.
//!
//! Thin wrapper around `tracing-subscriber` so binaries and tests
//! initialize logging the same way. `RUST_LOG` wins over the configured
//! level when set.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging from a [`LoggingConfig`].
///
/// Safe to call once per process; later calls are ignored so tests that
/// race to initialize do not panic.
pub fn init(config: &LoggingConfig) {
    let default_directive = format!("info,{}={}", env!("CARGO_CRATE_NAME"), config.log_level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    let _ = result;
}

/// Initialize logging with defaults, honoring `RUST_LOG`.
pub fn init_from_env() {
    init(&LoggingConfig::default());
}
