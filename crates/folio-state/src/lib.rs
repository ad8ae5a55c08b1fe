//! Request-scoped state handed from server to client.
//!
//! This crate provides:
//! - `GlobalState` / `GlobalAction` - App-wide context and its reducer
//! - `StoreState` / `StoreUpdate` - Reactive store snapshot and diff channel
//! - `StateScripts` - Script-embedded, `<`-escaped JSON for each slice
//! - `parse_embedded` - The client-side inverse, used for verification

mod error;
mod global;
mod serializer;
mod store;

pub use error::*;
pub use global::*;
pub use serializer::*;
pub use store::*;
