//! Streaming errors.

use folio_core::Placeholder;
use folio_state::StateError;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("head segment not sent")]
    HeadNotSent,

    #[error("head segment already sent")]
    HeadAlreadySent,

    #[error("response already completed")]
    Completed,

    /// The response consumer went away.
    #[error("client disconnected: {0}")]
    Disconnected(String),

    #[error("template has no {0} marker")]
    MissingMarker(Placeholder),

    #[error(transparent)]
    State(#[from] StateError),
}
