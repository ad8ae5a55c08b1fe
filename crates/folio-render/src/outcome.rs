//! Render results handed to the compositor.

use std::fmt;

use folio_query::DehydratedState;
use folio_state::{GlobalState, StateError, StateScripts, StoreState};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::task::AbortHandle;

use crate::RenderError;

/// Markup chunks in document order. An `Err` item means rendering failed
/// after earlier chunks were produced.
pub type MarkupStream = BoxStream<'static, Result<String, RenderError>>;

/// Aborts the render task when the stream reading its output goes away.
pub(crate) struct AbortOnDrop(pub(crate) AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A finished render for exactly one request.
///
/// Owned by that request's response writer and never cached. The state
/// slices are optional; an absent slice produces no script.
pub struct RenderOutcome {
    pub markup: MarkupStream,
    pub head_tags: String,
    pub query_state: Option<DehydratedState>,
    pub global_state: Option<GlobalState>,
    pub store_state: Option<StoreState>,
}

impl RenderOutcome {
    pub fn new(markup: MarkupStream, head_tags: impl Into<String>) -> Self {
        Self {
            markup,
            head_tags: head_tags.into(),
            query_state: None,
            global_state: None,
            store_state: None,
        }
    }

    /// Outcome whose markup is a fixed list of chunks.
    pub fn from_chunks(chunks: Vec<Result<String, RenderError>>, head_tags: impl Into<String>) -> Self {
        Self::new(stream::iter(chunks).boxed(), head_tags)
    }

    pub fn with_query_state(mut self, state: DehydratedState) -> Self {
        self.query_state = Some(state);
        self
    }

    pub fn with_global_state(mut self, state: GlobalState) -> Self {
        self.global_state = Some(state);
        self
    }

    pub fn with_store_state(mut self, state: StoreState) -> Self {
        self.store_state = Some(state);
        self
    }

    /// Serialize the state slices for the tail placeholders.
    pub fn state_scripts(&self) -> Result<StateScripts, StateError> {
        StateScripts::from_slices(
            self.query_state.as_ref(),
            self.global_state.as_ref(),
            self.store_state.as_ref(),
        )
    }
}

impl fmt::Debug for RenderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOutcome")
            .field("head_tags", &self.head_tags)
            .field("query_state", &self.query_state)
            .field("global_state", &self.global_state)
            .field("store_state", &self.store_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Cookies;
    use folio_state::StateSlot;

    #[tokio::test]
    async fn test_from_chunks_streams_in_order() {
        let outcome = RenderOutcome::from_chunks(
            vec![Ok("<main>".to_string()), Ok("</main>".to_string())],
            "",
        );
        let chunks: Vec<_> = outcome.markup.collect().await;
        let chunks: Vec<String> = chunks.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(chunks, vec!["<main>", "</main>"]);
    }

    #[test]
    fn test_state_scripts_only_for_present_slices() {
        let outcome = RenderOutcome::from_chunks(Vec::new(), "")
            .with_global_state(GlobalState::seed(&Cookies::new()));
        let scripts = outcome.state_scripts().unwrap();
        assert_eq!(scripts.script(StateSlot::Query), "");
        assert!(!scripts.script(StateSlot::Global).is_empty());
    }
}
