//! Script-embedded state payloads.
//!
//! Each slice becomes `<script>window.NAME = JSON</script>` with every `<`
//! in the JSON written as `\u003c`, so no payload can close the script
//! element or open a new one. U+2028 and U+2029 are escaped too, since
//! older JavaScript engines reject them inside string literals. JSON
//! parsers decode the escapes, so the embedded text parses to a value equal
//! to the original.

use folio_core::Placeholder;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{GlobalState, StateError, StoreState};

/// The three client bootstrap globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSlot {
    /// Dehydrated query cache.
    Query,
    /// [`GlobalState`].
    Global,
    /// [`StoreState`].
    Store,
}

impl StateSlot {
    pub const ALL: [StateSlot; 3] = [StateSlot::Query, StateSlot::Global, StateSlot::Store];

    /// Name of the `window` property the client reads and then deletes.
    pub const fn global_name(self) -> &'static str {
        match self {
            StateSlot::Query => "__REACT_QUERY_STATE__",
            StateSlot::Global => "__INITIAL_STATE__",
            StateSlot::Store => "__INITIAL_VALTIO_STATE__",
        }
    }

    /// Template marker this slot's script replaces.
    pub const fn placeholder(self) -> Placeholder {
        match self {
            StateSlot::Query => Placeholder::Data,
            StateSlot::Global => Placeholder::InitialState,
            StateSlot::Store => Placeholder::InitialStoreState,
        }
    }
}

/// JSON text of `value` with every `<` and line/paragraph separator escaped.
pub fn to_embeddable_json<T: Serialize + ?Sized>(
    slot: StateSlot,
    value: &T,
) -> Result<String, StateError> {
    let json = serde_json::to_string(value).map_err(|source| StateError::Serialize {
        global: slot.global_name(),
        source,
    })?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

/// Script assigning `slice` to the slot's global, or `None` when the slice is absent.
pub fn serialize_slice<T: Serialize + ?Sized>(
    slot: StateSlot,
    slice: Option<&T>,
) -> Result<Option<String>, StateError> {
    let Some(value) = slice else {
        return Ok(None);
    };
    let json = to_embeddable_json(slot, value)?;
    Ok(Some(format!(
        "<script>window.{} = {}</script>",
        slot.global_name(),
        json
    )))
}

/// Recover a slice from a script produced by [`serialize_slice`].
pub fn parse_embedded<T: DeserializeOwned>(slot: StateSlot, script: &str) -> Result<T, StateError> {
    let missing = || StateError::MissingAssignment {
        global: slot.global_name(),
    };
    let prefix = format!("<script>window.{} = ", slot.global_name());

    let start = script.find(&prefix).ok_or_else(missing)? + prefix.len();
    let rest = &script[start..];
    let end = rest.find("</script>").ok_or_else(missing)?;

    serde_json::from_str(&rest[..end]).map_err(|source| StateError::Parse {
        global: slot.global_name(),
        source,
    })
}

/// Serialized scripts for one render, ready for the tail placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateScripts {
    pub query: Option<String>,
    pub global: Option<String>,
    pub store: Option<String>,
}

impl StateScripts {
    /// Serialize each present slice independently.
    pub fn from_slices<Q: Serialize + ?Sized>(
        query: Option<&Q>,
        global: Option<&GlobalState>,
        store: Option<&StoreState>,
    ) -> Result<Self, StateError> {
        Ok(Self {
            query: serialize_slice(StateSlot::Query, query)?,
            global: serialize_slice(StateSlot::Global, global)?,
            store: serialize_slice(StateSlot::Store, store)?,
        })
    }

    /// Script for `slot`, or an empty string when that slice was omitted.
    pub fn script(&self, slot: StateSlot) -> &str {
        let script = match slot {
            StateSlot::Query => &self.query,
            StateSlot::Global => &self.global,
            StateSlot::Store => &self.store,
        };
        script.as_deref().unwrap_or_default()
    }
}
