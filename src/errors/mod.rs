//! # Error Handling
//!
//! Error types for the extension dispatcher, built with `thiserror`.
//!
//! Two layers exist:
//! - [`ExtensionError`] / [`ExtensionErrors`] describe individual patch attempts that
//!   failed during one dispatch pass. They never abort the pass.
//! - [`Error`] is the crate-level error returned by configuration loading, resource
//!   decoding and the extension runner, which decides whether a pass is fatal.

mod patch;

pub use patch::{ExtensionError, ExtensionErrors, PatchError};

/// Custom result type for envoy-extender operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for envoy-extender
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// A resource payload could not be decoded as its declared type
    #[error("Failed to decode resource of type '{type_url}'")]
    Decode {
        type_url: String,
        #[source]
        source: prost::DecodeError,
    },

    /// A resource payload carried a type URL the index does not hold
    #[error("Unsupported resource type URL '{0}'")]
    UnknownTypeUrl(String),

    /// A required extension is not registered
    #[error("Envoy extension '{name}' for service '{service}' is not registered")]
    ExtensionNotFound { name: String, service: String },

    /// A required extension failed to apply
    #[error("Failed to apply envoy extension '{name}' for service '{service}': {errors}")]
    Extension { name: String, service: String, errors: ExtensionErrors },

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        // Nested struct and list failures carry no direct field errors
        let message = if message.is_empty() { errors.to_string() } else { message };

        Self::validation(format!("Validation failed: {}", message))
    }
}
