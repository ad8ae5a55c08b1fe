//! Route data loaders.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use folio_core::RequestContext;
use folio_query::QueryClient;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// What a loader hands back instead of throwing.
///
/// `Redirect` and `NotFound` are ordinary outcomes: they stop the render
/// before any markup exists. `Error` is a real failure and is logged.
pub enum LoaderResult {
    Data(Value),
    Redirect { status: StatusCode, location: String },
    NotFound,
    Error(anyhow::Error),
}

impl LoaderResult {
    /// Serialize `value` as this route's data.
    pub fn data<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => LoaderResult::Data(value),
            Err(err) => LoaderResult::Error(err.into()),
        }
    }

    /// No route data. The loader only warmed the query cache.
    pub fn empty() -> Self {
        LoaderResult::Data(Value::Null)
    }

    /// 302 to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::redirect_with(StatusCode::FOUND, location)
    }

    pub fn redirect_with(status: StatusCode, location: impl Into<String>) -> Self {
        LoaderResult::Redirect {
            status,
            location: location.into(),
        }
    }

    pub fn error(error: impl Into<anyhow::Error>) -> Self {
        LoaderResult::Error(error.into())
    }

    pub fn is_data(&self) -> bool {
        matches!(self, LoaderResult::Data(_))
    }
}

impl fmt::Debug for LoaderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderResult::Data(value) => f.debug_tuple("Data").field(value).finish(),
            LoaderResult::Redirect { status, location } => f
                .debug_struct("Redirect")
                .field("status", status)
                .field("location", location)
                .finish(),
            LoaderResult::NotFound => f.write_str("NotFound"),
            LoaderResult::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
        }
    }
}

impl<T: Serialize> From<anyhow::Result<T>> for LoaderResult {
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => LoaderResult::data(value),
            Err(err) => LoaderResult::Error(err),
        }
    }
}

/// Everything a loader may read.
#[derive(Debug, Clone)]
pub struct LoaderContext {
    /// Request inputs, with the matched route params filled in.
    pub request: RequestContext,
    /// The render's query cache; data fetched here is dehydrated for the client.
    pub query: QueryClient,
    /// Pattern of the route this loader belongs to.
    pub route: String,
}

impl LoaderContext {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request.cookie(name)
    }
}

/// Data loader attached to a route.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, ctx: LoaderContext) -> LoaderResult;
}

/// Loader backed by an async closure.
pub struct FnLoader<F> {
    f: F,
}

/// Wrap an async closure as a [`Loader`].
pub fn loader_fn<F, Fut>(f: F) -> FnLoader<F>
where
    F: Fn(LoaderContext) -> Fut + Send + Sync,
    Fut: Future<Output = LoaderResult> + Send,
{
    FnLoader { f }
}

#[async_trait]
impl<F, Fut> Loader for FnLoader<F>
where
    F: Fn(LoaderContext) -> Fut + Send + Sync,
    Fut: Future<Output = LoaderResult> + Send,
{
    async fn load(&self, ctx: LoaderContext) -> LoaderResult {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{RenderRequest, RequestId};
    use serde_json::json;

    fn ctx(url: &str) -> LoaderContext {
        LoaderContext {
            request: RequestContext::from_request(&RenderRequest::new(url), RequestId::generate()),
            query: QueryClient::new(),
            route: "/".to_string(),
        }
    }

    // === LoaderResult Tests ===

    #[test]
    fn test_data_serializes() {
        match LoaderResult::data(json!({"id": 1})) {
            LoaderResult::Data(v) => assert_eq!(v, json!({"id": 1})),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_redirect_defaults_to_found() {
        match LoaderResult::redirect("/login") {
            LoaderResult::Redirect { status, location } => {
                assert_eq!(status, StatusCode::FOUND);
                assert_eq!(location, "/login");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_anyhow_result() {
        let ok: anyhow::Result<u32> = Ok(3);
        assert!(LoaderResult::from(ok).is_data());

        let err: anyhow::Result<u32> = Err(anyhow::anyhow!("db down"));
        assert!(matches!(LoaderResult::from(err), LoaderResult::Error(_)));
    }

    // === FnLoader Tests ===

    #[tokio::test]
    async fn test_loader_fn_reads_context() {
        let loader = loader_fn(|ctx: LoaderContext| async move {
            match ctx.request.query_param("q") {
                Some(q) => LoaderResult::data(q),
                None => LoaderResult::NotFound,
            }
        });

        assert!(matches!(loader.load(ctx("/search")).await, LoaderResult::NotFound));
        match loader.load(ctx("/search?q=rust")).await {
            LoaderResult::Data(v) => assert_eq!(v, json!("rust")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
