//! State serialization errors.

use thiserror::Error;

/// Errors produced while embedding or recovering a state slice.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to serialize {global}: {source}")]
    Serialize {
        global: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("script does not assign window.{global}")]
    MissingAssignment { global: &'static str },

    #[error("failed to parse embedded {global}: {source}")]
    Parse {
        global: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
