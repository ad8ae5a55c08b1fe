//! Rendering of a loaded route chain into markup.
//!
//! This crate provides:
//! - `RouteView` - What a route contributes to the page
//! - `RenderScope` - Fresh per-request query cache, global state, store snapshot and head collector
//! - `StreamingRenderer` / `BlockingRenderer` - The two render modes
//! - `RenderOutcome` - Markup stream plus head tags and state slices for the compositor
//! - `HeadContent` - Title, meta, link and script tags

mod error;
mod head;
mod outcome;
mod renderer;
mod scope;
mod view;

pub use error::*;
pub use head::*;
pub use outcome::*;
pub use renderer::*;
pub use scope::*;
pub use view::*;
