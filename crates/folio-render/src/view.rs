//! Route views.

use std::sync::Arc;

use async_trait::async_trait;
use folio_router::{LoadedChain, RouteNode, RouteTree};
use serde_json::Value;

use crate::RenderScope;

/// Markup one route contributes, wrapped around its child route's markup.
///
/// A leaf route usually only has `open`. A layout puts everything before
/// its outlet in `open` and everything after it in `close`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub open: String,
    pub close: String,
}

impl Fragment {
    pub fn wrap(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn leaf(html: impl Into<String>) -> Self {
        Self {
            open: html.into(),
            close: String::new(),
        }
    }
}

/// The UI attached to a route.
///
/// `data` is the route's own loader data (`Null` without a loader).
/// Loader results are final by the time a view runs; a view never
/// triggers loading itself, though it may read the query cache.
#[async_trait]
pub trait RouteView: Send + Sync {
    async fn render(&self, scope: &RenderScope, data: &Value) -> anyhow::Result<Fragment>;
}

pub type ViewHandle = Arc<dyn RouteView>;
pub type ViewNode = RouteNode<ViewHandle>;
pub type ViewTree = RouteTree<ViewHandle>;
pub type ViewChain = LoadedChain<ViewHandle>;

/// View backed by a synchronous closure.
pub struct FnView<F> {
    f: F,
}

/// Wrap a closure as a [`ViewHandle`].
pub fn view_fn<F>(f: F) -> ViewHandle
where
    F: Fn(&RenderScope, &Value) -> anyhow::Result<Fragment> + Send + Sync + 'static,
{
    Arc::new(FnView { f })
}

#[async_trait]
impl<F> RouteView for FnView<F>
where
    F: Fn(&RenderScope, &Value) -> anyhow::Result<Fragment> + Send + Sync,
{
    async fn render(&self, scope: &RenderScope, data: &Value) -> anyhow::Result<Fragment> {
        (self.f)(scope, data)
    }
}
