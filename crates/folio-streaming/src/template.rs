//! The shell cut into head and tail segments.

use folio_core::Placeholder;
use folio_state::{StateScripts, StateSlot};

use crate::StreamError;

/// Shell text split at the markup marker.
///
/// Everything before `<!--app-html-->` is the head segment, everything after
/// it is the tail. Each remaining marker is replaced at most once, in the
/// segment that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSplit {
    head: String,
    tail: String,
}

impl TemplateSplit {
    pub fn new(template: &str) -> Result<Self, StreamError> {
        let (head, tail) = template
            .split_once(Placeholder::Html.token())
            .ok_or(StreamError::MissingMarker(Placeholder::Html))?;
        Ok(Self {
            head: head.to_string(),
            tail: tail.to_string(),
        })
    }

    /// Head segment with the collected head tags in place of `<!--app-head-->`.
    pub fn render_head(&self, head_tags: &str) -> String {
        self.head.replacen(Placeholder::Head.token(), head_tags, 1)
    }

    /// Tail segment with each state marker replaced by its script, or by
    /// nothing when that slice is absent.
    pub fn render_tail(&self, scripts: &StateScripts) -> String {
        StateSlot::ALL.iter().fold(self.tail.clone(), |tail, slot| {
            tail.replacen(slot.placeholder().token(), scripts.script(*slot), 1)
        })
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }
}
