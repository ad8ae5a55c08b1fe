//! Streaming primitives for head-first SSR responses.
//!
//! This crate enforces the document write order:
//! - `StreamingSink` - Refuses body bytes before the head and anything after the tail
//! - `TemplateSplit` - The shell cut once at the markup marker
//! - `Document` - Head, markup stream and tail for one response
//! - `StreamCompositor` - Writes a document, finishing the tail even when the markup fails

mod compositor;
mod error;
mod sink;
mod template;

pub use compositor::*;
pub use error::*;
pub use sink::*;
pub use template::*;
