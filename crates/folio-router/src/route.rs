//! Route table definition.

use std::fmt;
use std::sync::Arc;

use crate::matcher::{rank_branches, Branch};
use crate::{Loader, RouteMatch};

/// One entry in the route table.
///
/// `V` is whatever the rendering layer attaches to a route (a view, a
/// component handle). The router never inspects it.
pub struct RouteNode<V> {
    path: String,
    index: bool,
    loader: Option<Arc<dyn Loader>>,
    view: Option<V>,
    children: Vec<Arc<RouteNode<V>>>,
}

impl<V> RouteNode<V> {
    /// Route for `path`, relative to its parent. Leading and trailing
    /// slashes are ignored, so `"/detail/:id"` and `"detail/:id"` are equal.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into().trim_matches('/').to_string(),
            index: false,
            loader: None,
            view: None,
            children: Vec::new(),
        }
    }

    /// Index route: matches when the parent's path is matched exactly.
    pub fn index() -> Self {
        Self {
            index: true,
            ..Self::new("")
        }
    }

    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn with_shared_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_view(mut self, view: V) -> Self {
        self.view = Some(view);
        self
    }

    /// Append a nested route. Declaration order breaks ranking ties.
    pub fn with_child(mut self, child: RouteNode<V>) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RouteNode<V>>) -> Self {
        self.children.extend(children.into_iter().map(Arc::new));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_index(&self) -> bool {
        self.index
    }

    pub fn loader(&self) -> Option<&Arc<dyn Loader>> {
        self.loader.as_ref()
    }

    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    pub fn children(&self) -> &[Arc<RouteNode<V>>] {
        &self.children
    }
}

impl<V> fmt::Debug for RouteNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("path", &self.path)
            .field("index", &self.index)
            .field("loader", &self.loader.is_some())
            .field("view", &self.view.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// The static route table, ranked once at construction.
///
/// Shared read-only by every request for the lifetime of the process.
pub struct RouteTree<V> {
    routes: Vec<Arc<RouteNode<V>>>,
    branches: Vec<Branch<V>>,
}

impl<V> RouteTree<V> {
    pub fn new(routes: impl IntoIterator<Item = RouteNode<V>>) -> Self {
        let routes: Vec<_> = routes.into_iter().map(Arc::new).collect();
        let branches = rank_branches(&routes);
        Self { routes, branches }
    }

    pub fn routes(&self) -> &[Arc<RouteNode<V>>] {
        &self.routes
    }

    /// Every matchable pattern, best-ranked first.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|b| b.pattern())
    }

    /// Best-ranked route chain for `path`, or `None` when nothing matches.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<V>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.branches
            .iter()
            .find_map(|branch| branch.match_segments(&segments))
    }
}

impl<V> fmt::Debug for RouteTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTree")
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}
