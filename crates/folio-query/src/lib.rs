//! Request-scoped data-fetching cache.
//!
//! One `QueryClient` is created per render. Loaders fill it, views read
//! from it, and at the end of the render it is dehydrated into the
//! `__REACT_QUERY_STATE__` payload and cleared.
//!
//! - `QueryClient` - Cache with per-key fetch coalescing
//! - `QueryKey` - Structured cache key
//! - `QueryOptions` / `RetryPolicy` - Staleness, retry and timeout policy
//! - `DehydratedState` - Serializable snapshot of successful queries

mod client;
mod dehydrate;
mod error;
mod key;
mod options;

pub use client::*;
pub use dehydrate::*;
pub use error::*;
pub use key::*;
pub use options::*;
