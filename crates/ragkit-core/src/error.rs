use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ingestion failed for '{source_name}': {reason}")]
    Ingestion { source_name: String, reason: String },

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Pipeline is not ready; call prepare() first")]
    NotReady,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of an external embedding or generation service.
///
/// `Transient` failures (timeouts, refused connections, 5xx, 429) are worth
/// retrying; `Permanent` ones are not.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{service} unavailable: {message}")]
    Transient { service: String, message: String },

    #[error("{service} failed: {message}")]
    Permanent { service: String, message: String },

    #[error("{service} timed out after {elapsed:?}")]
    Timeout { service: String, elapsed: Duration },
}

impl BackendError {
    pub fn transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient { service: service.into(), message: message.into() }
    }

    pub fn permanent(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permanent { service: service.into(), message: message.into() }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout { .. })
    }

    pub fn service(&self) -> &str {
        match self {
            Self::Transient { service, .. } | Self::Permanent { service, .. } | Self::Timeout { service, .. } => service,
        }
    }
}
