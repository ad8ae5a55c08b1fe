//! Public SDK for the folio SSR pipeline.
//!
//! This crate re-exports every pipeline crate:
//!
//! ```ignore
//! use folio_sdk::prelude::*;
//!
//! let routes = RouteTree::new(vec![RouteNode::new("/")
//!     .with_loader(loader_fn(|ctx| async move {
//!         LoaderResult::data(load_home(&ctx.query).await)
//!     }))
//!     .with_view(view_fn(|scope, data| {
//!         scope.head().set_title("Home");
//!         Ok(Fragment::leaf(render_home(data)))
//!     }))]);
//!
//! let middleware = SsrMiddleware::from_config(SsrConfig::load("folio.toml")?, routes, vec![]);
//! match middleware.dispatch(RenderRequest::new("/")).await {
//!     Dispatch::Bypass(request) => api.handle(request).await,
//!     Dispatch::Response(response) => response.into_http(),
//! }
//! ```

pub use folio_core;
pub use folio_observability;
pub use folio_query;
pub use folio_render;
pub use folio_router;
pub use folio_server;
pub use folio_state;
pub use folio_streaming;
pub use folio_template;

/// Prelude for convenient imports.
pub mod prelude {
    pub use folio_core::*;
    pub use folio_observability::*;
    pub use folio_query::*;
    pub use folio_render::*;
    pub use folio_router::*;
    pub use folio_server::*;
    pub use folio_state::*;
    pub use folio_streaming::*;
    pub use folio_template::*;
}
