//! # Structured Logging
//!
//! Installs the global `tracing` subscriber and provides span helpers for
//! extension work.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Create a tracing span for applying one extension on behalf of one upstream.
///
/// ```rust,ignore
/// let span = extension_span!("builtin/aws/lambda", "db", kind = "connect-proxy");
/// ```
#[macro_export]
macro_rules! extension_span {
    ($extension:expr, $service:expr) => {
        tracing::info_span!(
            "extension_operation",
            extension = %$extension,
            service = %$service
        )
    };
    ($extension:expr, $service:expr, $($field:tt)*) => {
        tracing::info_span!(
            "extension_operation",
            extension = %$extension,
            service = %$service,
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured log level. Returns an error if a
/// global subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logging = config.json_logging,
        metrics_enabled = config.enable_metrics,
        "Logging initialized"
    );

    Ok(())
}
