//! The SSR entry point.
//!
//! This crate provides:
//! - `SsrMiddleware` - Decides eligibility, runs the pipeline, maps failures to HTTP outcomes
//! - `SsrResponse` - Status, headers and a full or streamed body
//! - `ErrorPage` - 404 and 500 bodies, with details only when errors are exposed

mod error_page;
mod middleware;
mod response;

pub use error_page::*;
pub use middleware::*;
pub use response::*;
