//! # Configuration Settings
//!
//! Defines the configuration structure for envoy-extender.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Error, Result};
use crate::xds::extension::EnvoyExtension;

/// Prefix of environment variables that override file settings, e.g.
/// `ENVOY_EXTENDER__OBSERVABILITY__LOG_LEVEL=debug`.
pub const ENV_PREFIX: &str = "ENVOY_EXTENDER";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Envoy extensions declared per upstream service
    pub service_defaults: HashMap<String, ServiceDefaults>,
}

impl AppConfig {
    /// Load configuration from an optional file, overlaid with `ENVOY_EXTENDER__*`
    /// environment variables, and validate it.
    ///
    /// The file format is inferred from its extension (YAML, TOML or JSON).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if tracing_subscriber::EnvFilter::try_new(&self.observability.log_level).is_err() {
            return Err(Error::validation_field(
                format!("Invalid log level directive '{}'", self.observability.log_level),
                "observability.log_level",
            ));
        }

        for (service, defaults) in &self.service_defaults {
            if service.is_empty() {
                return Err(Error::validation_field(
                    "Service name cannot be empty",
                    "service_defaults",
                ));
            }
            for extension in &defaults.envoy_extensions {
                Validate::validate(extension).map_err(Error::from)?;
            }
        }

        Ok(())
    }

    /// Extensions declared on a service, empty if none.
    pub fn extensions_for(&self, service: &str) -> &[EnvoyExtension] {
        self.service_defaults
            .get(service)
            .map(|defaults| defaults.envoy_extensions.as_slice())
            .unwrap_or_default()
    }
}

/// Per-service settings relevant to extension dispatch
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
#[serde(default)]
pub struct ServiceDefaults {
    /// Extensions applied when this service is an upstream of a proxy
    #[validate(nested)]
    pub envoy_extensions: Vec<EnvoyExtension>,
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Default log filter, used when `RUST_LOG` is not set
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Install a Prometheus recorder for patch metrics
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "envoy-extender".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: false,
        }
    }
}
