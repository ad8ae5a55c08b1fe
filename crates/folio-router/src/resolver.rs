//! URL matching and loader execution.

use std::fmt;
use std::sync::Arc;

use folio_core::{RequestContext, RouteParams};
use folio_query::QueryClient;
use futures::future::join_all;
use serde_json::Value;

use crate::{LoaderContext, LoaderResult, MatchedRoute, RouteError, RouteMatch, RouteTree};

/// Matches URLs against the shared route tree and runs the matched loaders.
pub struct RouteResolver<V> {
    tree: Arc<RouteTree<V>>,
}

impl<V> Clone for RouteResolver<V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<V: Send + Sync + 'static> RouteResolver<V> {
    pub fn new(tree: RouteTree<V>) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }

    pub fn from_shared(tree: Arc<RouteTree<V>>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Arc<RouteTree<V>> {
        &self.tree
    }

    /// Match the path part of `url`.
    pub fn match_url(&self, url: &str) -> Result<RouteMatch<V>, RouteError> {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        let path = &url[..end];
        self.tree
            .match_path(path)
            .ok_or_else(|| RouteError::NoMatch {
                path: path.to_string(),
            })
    }

    /// Run every loader in the chain and collect their data.
    ///
    /// Loaders run concurrently, and all of them finish before this
    /// returns. Outcomes are then read in declaration order, so a parent
    /// route's redirect or not-found takes precedence over its children's.
    pub async fn run_loaders(
        &self,
        matched: RouteMatch<V>,
        request: &RequestContext,
        query: &QueryClient,
    ) -> Result<LoadedChain<V>, RouteError> {
        let context = request.clone().with_params(matched.params().clone());

        let loads = matched.chain().iter().map(|route| {
            let loader = route.node().loader().cloned();
            let ctx = LoaderContext {
                request: context.clone(),
                query: query.clone(),
                route: route.pattern().to_string(),
            };
            async move {
                match loader {
                    Some(loader) => loader.load(ctx).await,
                    None => LoaderResult::empty(),
                }
            }
        });
        let results = join_all(loads).await;

        let mut data = Vec::with_capacity(results.len());
        for (route, result) in matched.chain().iter().zip(results) {
            let route_pattern = route.pattern().to_string();
            match result {
                LoaderResult::Data(value) => data.push(value),
                LoaderResult::Redirect { status, location } => {
                    tracing::debug!(route = %route_pattern, %status, %location, "loader redirected");
                    return Err(RouteError::Redirect {
                        route: route_pattern,
                        status,
                        location,
                    });
                }
                LoaderResult::NotFound => {
                    tracing::debug!(route = %route_pattern, "loader reported not found");
                    return Err(RouteError::NotFound {
                        route: route_pattern,
                        path: context.path.clone(),
                    });
                }
                LoaderResult::Error(error) => {
                    return Err(RouteError::LoaderFailed {
                        route: route_pattern,
                        error,
                    });
                }
            }
        }

        tracing::debug!(route = %matched.pattern(), loaders = data.len(), "loaders resolved");
        Ok(LoadedChain {
            matched,
            data,
            context,
        })
    }
}

/// A matched route chain whose loaders all returned data.
pub struct LoadedChain<V> {
    matched: RouteMatch<V>,
    /// One entry per chain node; `Null` where the node has no loader.
    data: Vec<Value>,
    context: RequestContext,
}

impl<V> LoadedChain<V> {
    /// Each matched route with its loader data, outermost first.
    pub fn routes(&self) -> impl Iterator<Item = (&MatchedRoute<V>, &Value)> {
        self.matched.chain().iter().zip(&self.data)
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// Data of the innermost route.
    pub fn leaf_data(&self) -> Option<&Value> {
        self.data.last()
    }

    pub fn pattern(&self) -> &str {
        self.matched.pattern()
    }

    pub fn params(&self) -> &RouteParams {
        self.matched.params()
    }

    /// Request context with route params applied.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn route_match(&self) -> &RouteMatch<V> {
        &self.matched
    }
}

impl<V> Clone for LoadedChain<V> {
    fn clone(&self) -> Self {
        Self {
            matched: self.matched.clone(),
            data: self.data.clone(),
            context: self.context.clone(),
        }
    }
}

impl<V> fmt::Debug for LoadedChain<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedChain")
            .field("pattern", &self.pattern())
            .field("data", &self.data)
            .finish()
    }
}
