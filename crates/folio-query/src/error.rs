//! Query errors.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`crate::QueryClient`] operations.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The fetch function failed on every attempt.
    #[error("query {key} failed: {message}")]
    Fetch { key: String, message: String },

    /// A single attempt exceeded the configured fetch timeout.
    #[error("query {key} timed out after {after:?}")]
    Timeout { key: String, after: Duration },

    /// Cached data could not be converted to or from the requested type.
    #[error("query {key} data mismatch: {message}")]
    Data { key: String, message: String },
}

impl QueryError {
    /// Hash of the query that failed.
    pub fn key(&self) -> &str {
        match self {
            QueryError::Fetch { key, .. }
            | QueryError::Timeout { key, .. }
            | QueryError::Data { key, .. } => key,
        }
    }
}
