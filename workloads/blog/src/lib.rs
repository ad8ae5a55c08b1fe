//! Blog site - Reference workload for the folio SSR pipeline.
//!
//! This workload demonstrates:
//! - A layout route wrapping every page, reading hydrated global and store state
//! - Loaders that fill the request's query cache through a `ContentSource`
//! - Not-found from a loader (`/detail/:id`) and a cookie-guarded redirect (`/drafts`)
//! - Open Graph head tags contributed by a view

mod data;
mod pages;

use std::sync::Arc;

use folio_sdk::prelude::*;

pub use data::*;
pub use pages::*;

/// The development shell.
pub const INDEX_HTML: &str = include_str!("../index.html");

/// The route table:
///
/// ```text
/// /                layout
/// ├── ''           article list
/// ├── about
/// ├── detail/:id   404 for unknown ids
/// ├── categories
/// ├── tags
/// └── drafts       302 to /login without the auth cookie
/// ```
pub fn routes(source: Arc<dyn ContentSource>) -> ViewTree {
    RouteTree::new(vec![RouteNode::new("/")
        .with_view(layout_view())
        .with_children(vec![
            RouteNode::index()
                .with_loader(HomeLoader::new(source.clone()))
                .with_view(home_view()),
            RouteNode::new("about")
                .with_loader(AboutLoader::new(source.clone()))
                .with_view(about_view()),
            RouteNode::new("detail/:id")
                .with_loader(DetailLoader::new(source.clone()))
                .with_view(detail_view()),
            RouteNode::new("categories")
                .with_loader(TaxonomyLoader::new(source.clone(), Taxonomy::Categories))
                .with_view(taxonomy_view(Taxonomy::Categories)),
            RouteNode::new("tags")
                .with_loader(TaxonomyLoader::new(source.clone(), Taxonomy::Tags))
                .with_view(taxonomy_view(Taxonomy::Tags)),
            RouteNode::new("drafts")
                .with_loader(DraftsLoader::new(source))
                .with_view(drafts_view()),
        ])])
}

/// Development transforms: the client entry is served by the dev server,
/// so inject its HMR client ahead of the app scripts.
pub fn dev_transforms() -> Vec<Arc<dyn HtmlTransform>> {
    vec![Arc::new(ScriptInjection::module("/@vite/client"))]
}

/// Middleware serving the blog with the template provider for `config.mode`.
pub fn middleware(config: SsrConfig, source: Arc<dyn ContentSource>) -> SsrMiddleware {
    tracing::debug!(mode = ?config.mode, "building blog middleware");
    SsrMiddleware::from_config(config, routes(source), dev_transforms())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn blog() -> SsrMiddleware {
        let templates = Arc::new(ProdTemplateProvider::new(StaticSource::new(INDEX_HTML)));
        SsrMiddleware::new(
            SsrConfig::production(),
            templates,
            routes(Arc::new(InMemoryContent::sample())),
        )
    }

    async fn get(request: RenderRequest) -> (StatusCode, String) {
        let response = blog().handle(request).await;
        (response.status, response.into_string().await)
    }

    // === Route Tests ===

    #[tokio::test]
    async fn test_home_lists_published_articles() {
        let (status, html) = get(RenderRequest::new("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Home - Simple Blog</title>"));
        assert!(html.contains("Streaming server rendering"));
        assert!(!html.contains("Upcoming: route loaders"));
        assert!(html.contains("window.__REACT_QUERY_STATE__"));
        assert!(html.contains(r#"data-theme="light""#));
        assert!(html.contains("Server Rendered Title"));
    }

    #[tokio::test]
    async fn test_detail_has_open_graph_tags() {
        let (status, html) = get(RenderRequest::new("/detail/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Hydrating state safely - Simple Blog</title>"));
        assert!(html.contains(r#"<meta property="og:type" content="article">"#));
        assert!(html.contains(r#"<span class="tag">#security</span>"#));
    }

    #[tokio::test]
    async fn test_encoded_detail_id_is_decoded() {
        let (status, html) = get(RenderRequest::new("/detail/%31")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Streaming server rendering - Simple Blog</title>"));
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_detail_is_404() {
        for url in ["/detail/99", "/detail/abc", "/detail/4"] {
            let (status, _) = get(RenderRequest::new(url)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{url}");
        }
    }

    #[tokio::test]
    async fn test_drafts_redirect_without_cookie() {
        let response = blog().handle(RenderRequest::new("/drafts")).await;
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.header("location"), Some(LOGIN_PATH));
    }

    #[tokio::test]
    async fn test_drafts_redirect_with_empty_cookie() {
        let response = blog()
            .handle(RenderRequest::new("/drafts").with_cookie(AUTH_COOKIE, ""))
            .await;
        assert_eq!(response.status, StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_drafts_with_cookie() {
        let (status, html) = get(RenderRequest::new("/drafts").with_cookie(AUTH_COOKIE, "abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Upcoming: route loaders"));
        assert!(html.contains("Hi, SSR User"));
    }

    #[tokio::test]
    async fn test_taxonomy_pages() {
        let (_, categories) = get(RenderRequest::new("/categories")).await;
        assert!(categories.contains(r#"<span class="name">Engineering</span><span class="count">2</span>"#));

        let (_, tags) = get(RenderRequest::new("/tags")).await;
        assert!(tags.contains(r#"<span class="name">ssr</span><span class="count">2</span>"#));
    }

    #[tokio::test]
    async fn test_about_uses_default_content() {
        let (status, html) = get(RenderRequest::new("/about")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>About - Simple Blog</title>"));
        assert!(html.contains("your-email@example.com"));
    }

    #[tokio::test]
    async fn test_unrouted_path_is_404() {
        let (status, html) = get(RenderRequest::new("/nowhere/at/all")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Page Not Found"));
    }
}
