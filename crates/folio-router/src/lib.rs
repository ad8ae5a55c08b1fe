//! Declarative route tree, path matching and data loaders.
//!
//! This crate provides:
//! - `RouteNode` / `RouteTree` - Static route table built once per process
//! - `Loader` / `LoaderResult` - Per-route data loading with explicit redirect and not-found outcomes
//! - `RouteResolver` - `match_url` then `run_loaders`, producing a `LoadedChain` for rendering

mod error;
mod loader;
mod matcher;
mod resolver;
mod route;

pub use error::*;
pub use loader::*;
pub use matcher::*;
pub use resolver::*;
pub use route::*;
