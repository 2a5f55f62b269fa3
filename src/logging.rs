//! Logging bootstrap.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::AppError;

/// Install the global `tracing` subscriber (stderr).
///
/// `RUST_LOG` wins when set; otherwise `debug` enables debug output and the
/// default is `info`.
pub fn init(debug: bool) -> Result<(), AppError> {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to initialise logging: {e}")))
}
