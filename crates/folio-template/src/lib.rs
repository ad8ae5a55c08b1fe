//! HTML shell resolution.
//!
//! This crate provides:
//! - `TemplateProvider` - `resolve(url) -> TemplateText`, plus `invalidate()`
//! - `DevTemplateProvider` - Re-reads and transforms the shell every call
//! - `ProdTemplateProvider` - Reads the built shell once, single-flight
//! - `TemplateSource` / `HtmlTransform` - Where the shell comes from and how it is rewritten

mod error;
mod provider;
mod source;
mod transform;

pub use error::*;
pub use provider::*;
pub use source::*;
pub use transform::*;

/// Shared, immutable HTML shell text.
pub type TemplateText = std::sync::Arc<str>;
