use crate::config::LogFormat;
use crate::error::{Result, ServerError};
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter` when it is set.
///
/// # Errors
///
/// Returns [`ServerError::Config`] for an unparsable filter or when a global
/// subscriber is already installed.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| {
            ServerError::Config(format!("invalid log level '{default_filter}': {e}"))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| ServerError::Config(format!("install tracing subscriber: {e}")))
}
