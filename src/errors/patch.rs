//! Errors produced while patching individual resources.

use std::fmt;

use crate::xds::resources::ResourceKind;

/// Failure reported by a [`Patcher`](crate::xds::extensions::Patcher).
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct PatchError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PatchError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source<S: Into<String>>(
        message: S,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self { message: message.into(), source: Some(source.into()) }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single failed attempt within one dispatch pass.
#[derive(thiserror::Error, Debug)]
pub enum ExtensionError {
    #[error("error patching cluster '{name}': {source}")]
    Cluster {
        name: String,
        #[source]
        source: PatchError,
    },

    #[error("error patching route '{name}': {source}")]
    Route {
        name: String,
        #[source]
        source: PatchError,
    },

    #[error("error patching filter '{filter}' of listener '{listener}': {source}")]
    ListenerFilter {
        listener: String,
        filter: String,
        #[source]
        source: PatchError,
    },

    #[error("unsupported resource '{name}' was skipped: indexed as {expected} but holds {found}")]
    KindMismatch { name: String, expected: ResourceKind, found: ResourceKind },
}

/// Every failure from one dispatch pass. Never empty.
#[derive(Debug)]
pub struct ExtensionErrors(Vec<ExtensionError>);

impl ExtensionErrors {
    /// Returns `None` when there is nothing to report.
    pub fn from_vec(errors: Vec<ExtensionError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<ExtensionError> {
        self.0
    }
}

impl fmt::Display for ExtensionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.0.as_slice() {
            return write!(f, "1 error occurred: {}", only);
        }

        write!(f, "{} errors occurred:", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n\t* {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExtensionErrors {}

impl IntoIterator for ExtensionErrors {
    type Item = ExtensionError;
    type IntoIter = std::vec::IntoIter<ExtensionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
