//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Default filter when `SEXTANT_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "sextant=info";

/// Initialize the Sextant tracing/logging system.
///
/// Reads `SEXTANT_LOG` for per-subsystem log levels, e.g.
/// `SEXTANT_LOG=sextant_extract=debug,sextant_storage=warn`.
/// Falls back to `sextant=info`. Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("SEXTANT_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // try_init: a host process may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
