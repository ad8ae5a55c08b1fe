//! Core abstractions for the folio SSR pipeline.
//!
//! This crate provides the fundamental types shared by every stage:
//! - `RenderRequest` / `RequestContext` - Per-request inputs
//! - `PipelineState` - Request lifecycle state machine
//! - `SsrConfig` / `RenderMode` - Process-wide configuration
//! - `SsrError` - Failure taxonomy mapped to HTTP outcomes
//! - `Placeholder` - Document placeholder tokens

mod config;
mod context;
mod error;
mod lifecycle;
mod placeholder;

pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use placeholder::*;
