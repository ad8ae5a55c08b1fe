//! Render errors.

use folio_core::SsrError;
use folio_state::StateError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A route's view failed.
    #[error("view for {route} failed: {error}")]
    View { route: String, error: anyhow::Error },

    /// The render task ended without signalling readiness.
    #[error("render aborted before completion")]
    Aborted,

    #[error(transparent)]
    State(#[from] StateError),
}

impl From<RenderError> for SsrError {
    fn from(err: RenderError) -> Self {
        SsrError::render_failure(err)
    }
}
