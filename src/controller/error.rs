//! Error types for the controller.
//!
//! Defines custom error types with classification for retry behavior.

use std::time::Duration;
use thiserror::Error;

/// Error type for controller operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Kubernetes API error wrapped with the operation that failed
    #[error("{context}: {source}")]
    Api {
        context: String,
        #[source]
        source: kube::Error,
    },

    /// Missing required field in resource
    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    /// Wrap a Kubernetes API error with operation context
    pub fn api(context: impl Into<String>, source: kube::Error) -> Self {
        Error::Api {
            context: context.into(),
            source,
        }
    }

    fn kube_error(&self) -> Option<&kube::Error> {
        match self {
            Error::Kube(e) => Some(e),
            Error::Api { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self.kube_error(), Some(kube::Error::Api(e)) if e.code == 404)
    }

    /// Check if this error indicates an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self.kube_error(), Some(kube::Error::Api(e)) if e.code == 409)
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube(e) | Error::Api { source: e, .. } => {
                // Retry on network errors, rate limiting, and server errors
                matches!(
                    e,
                    kube::Error::Api(api_err) if api_err.code >= 500 || api_err.code == 429
                ) || matches!(e, kube::Error::Service(_))
            }
            Error::MissingField(_) => false,
        }
    }

    /// Get the recommended requeue duration for this error
    pub fn requeue_after(&self) -> Duration {
        if self.is_retryable() {
            Duration::from_secs(30)
        } else {
            // Don't requeue eagerly for non-retryable errors
            Duration::from_secs(3600)
        }
    }
}

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;
