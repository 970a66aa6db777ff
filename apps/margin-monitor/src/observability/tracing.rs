//! Structured logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Error type for tracing setup.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// Failed to initialize the tracing subscriber.
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberError(String),
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The format is
/// `json` for machine-readable output or `pretty` for local runs.
///
/// # Errors
///
/// Returns an error if a subscriber has already been installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let result = if config.format == "pretty" {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };

    result.map_err(|e| TracingError::SubscriberError(e.to_string()))
}
