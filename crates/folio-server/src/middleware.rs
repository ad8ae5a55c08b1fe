//! Request orchestration.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{
    LifecycleObserver, PipelineState, PipelineTracker, RenderRequest, RequestContext, RequestId,
    SsrConfig, SsrError,
};
use folio_observability::{LogSink, MetricsCollector, StructuredLogger, TracingObserver};
use folio_render::{renderer_for, RenderScope, Renderer, ViewHandle, ViewTree};
use folio_router::RouteResolver;
use folio_state::StoreState;
use folio_streaming::{Document, StreamCompositor, StreamingSink, TemplateSplit};
use folio_template::{provider_for, HtmlTransform, TemplateProvider};
use futures::channel::mpsc;
use futures::StreamExt;
use http::StatusCode;

use crate::{ErrorPage, ResponseBody, SsrResponse};

/// Chunks buffered between the compositor and the HTTP body before the
/// compositor waits for the client.
const DEFAULT_BODY_BUFFER: usize = 16;

/// Builds the store slice for a request.
pub type StoreSeed = Arc<dyn Fn(&RequestContext) -> StoreState + Send + Sync>;

/// What to do with an incoming request.
#[derive(Debug)]
pub enum Dispatch {
    /// Not for SSR; hand it to the next handler untouched.
    Bypass(RenderRequest),
    /// The rendered response.
    Response(SsrResponse),
}

/// The server-side rendering middleware.
///
/// Every request gets its own logger, metrics, query cache and state. The
/// only thing shared between requests is the template provider, whose
/// production cache is filled once.
pub struct SsrMiddleware {
    config: Arc<SsrConfig>,
    templates: Arc<dyn TemplateProvider>,
    resolver: RouteResolver<ViewHandle>,
    renderer: Arc<dyn Renderer>,
    log_sink: Option<Arc<dyn LogSink>>,
    observer: Option<Arc<dyn LifecycleObserver>>,
    store_seed: Option<StoreSeed>,
    body_buffer: usize,
}

/// Output of the pre-commit phase: nothing has been written yet.
struct PreparedPage {
    document: Document,
}

impl SsrMiddleware {
    pub fn new(config: SsrConfig, templates: Arc<dyn TemplateProvider>, routes: ViewTree) -> Self {
        Self {
            renderer: renderer_for(&config),
            config: Arc::new(config),
            templates,
            resolver: RouteResolver::new(routes),
            log_sink: None,
            observer: None,
            store_seed: None,
            body_buffer: DEFAULT_BODY_BUFFER,
        }
    }

    /// Middleware with the template provider for the configured mode.
    pub fn from_config(
        config: SsrConfig,
        routes: ViewTree,
        dev_transforms: Vec<Arc<dyn HtmlTransform>>,
    ) -> Self {
        let templates = provider_for(&config, dev_transforms);
        Self::new(config, templates, routes)
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Copy every structured log entry to `sink`.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Also report pipeline transitions to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_store_seed<F>(mut self, seed: F) -> Self
    where
        F: Fn(&RequestContext) -> StoreState + Send + Sync + 'static,
    {
        self.store_seed = Some(Arc::new(seed));
        self
    }

    pub fn with_body_buffer(mut self, chunks: usize) -> Self {
        self.body_buffer = chunks.max(1);
        self
    }

    pub fn config(&self) -> &SsrConfig {
        &self.config
    }

    pub fn templates(&self) -> &Arc<dyn TemplateProvider> {
        &self.templates
    }

    /// Drop the cached production shell, e.g. after a new build.
    pub fn invalidate_template(&self) {
        self.templates.invalidate();
    }

    /// Route a request: API paths bypass SSR, everything else is rendered.
    pub async fn dispatch(&self, request: RenderRequest) -> Dispatch {
        if self.config.is_api_path(request.path()) {
            tracing::trace!(path = request.path(), "api path, skipping ssr");
            return Dispatch::Bypass(request);
        }
        Dispatch::Response(self.handle(request).await)
    }

    /// Render `request` into a response.
    ///
    /// Routing, loading and rendering run under the render deadline. Once
    /// they succeed the status is committed as 200 and the body streams
    /// from a background task; any failure before that becomes a
    /// redirect, 404 or 500.
    pub async fn handle(&self, request: RenderRequest) -> SsrResponse {
        let request_id = RequestId::generate();
        let mut logger = StructuredLogger::new(request_id.clone()).with_url(request.original_url());
        if let Some(sink) = &self.log_sink {
            logger = logger.with_sink(sink.clone());
        }
        let mut metrics = MetricsCollector::new(request_id.clone());
        let mut tracker = self.tracker(request_id.clone());
        advance(&mut tracker, PipelineState::Routing);

        let deadline = self.config.render_deadline();
        let prepared = tokio::time::timeout(
            deadline,
            self.prepare(&request, request_id, &mut tracker, &mut metrics, &mut logger),
        )
        .await
        .unwrap_or(Err(SsrError::Timeout { deadline }));

        match prepared {
            Ok(page) => self.stream(page, logger, metrics, tracker),
            Err(err) => self.fail(err, &logger, metrics, tracker),
        }
    }

    fn tracker(&self, request_id: RequestId) -> PipelineTracker {
        let logged: Arc<dyn LifecycleObserver> = Arc::new(TracingObserver::new(request_id));
        let observer: Arc<dyn LifecycleObserver> = match &self.observer {
            Some(extra) => Arc::new(Observers(vec![logged, extra.clone()])),
            None => logged,
        };
        PipelineTracker::new().with_observer(observer)
    }

    async fn prepare(
        &self,
        request: &RenderRequest,
        request_id: RequestId,
        tracker: &mut PipelineTracker,
        metrics: &mut MetricsCollector,
        logger: &mut StructuredLogger,
    ) -> Result<PreparedPage, SsrError> {
        let matched = self.resolver.match_url(request.original_url())?;
        logger.set_route(matched.pattern());
        metrics.set_route(matched.pattern());
        advance(tracker, PipelineState::Loading);

        let context = RequestContext::from_request(request, request_id);
        let mut scope = RenderScope::new(context.clone());
        if let Some(seed) = &self.store_seed {
            scope = scope.with_store(seed(&context));
        }

        let (template, loaded) = futures::join!(
            self.templates.resolve(request.original_url()),
            self.resolver.run_loaders(matched, &context, scope.query()),
        );
        // A redirect or not-found from a loader wins over a template failure.
        let chain = loaded?;
        let template = template?;
        let split = TemplateSplit::new(&template).map_err(SsrError::render_failure)?;
        advance(tracker, PipelineState::Rendering);

        let scope = scope.with_request(chain.context().clone());
        let outcome = self.renderer.render(chain, scope).await?;
        metrics.record_all_ready();

        let document = Document::assemble(&split, outcome).map_err(SsrError::render_failure)?;
        Ok(PreparedPage { document })
    }

    fn stream(
        &self,
        page: PreparedPage,
        logger: StructuredLogger,
        metrics: MetricsCollector,
        mut tracker: PipelineTracker,
    ) -> SsrResponse {
        advance(&mut tracker, PipelineState::Streaming);

        let (tx, rx) = mpsc::channel::<Vec<u8>>(self.body_buffer);
        let compositor = StreamCompositor::new(logger.clone(), metrics);
        tokio::spawn(async move {
            let mut sink = StreamingSink::new(tx);
            let report = compositor.compose(page.document, &mut sink).await;
            advance(&mut tracker, report.status.pipeline_state());
            logger
                .info_builder("request complete")
                .field("outcome", report.metrics.outcome.clone())
                .field("metrics", report.metrics.to_json())
                .emit();
        });

        SsrResponse::html(StatusCode::OK, ResponseBody::Stream(rx.boxed()))
    }

    fn fail(
        &self,
        err: SsrError,
        logger: &StructuredLogger,
        metrics: MetricsCollector,
        mut tracker: PipelineTracker,
    ) -> SsrResponse {
        let (state, response) = match &err {
            SsrError::Redirect { status, location } => {
                let status = if status.is_redirection() {
                    *status
                } else {
                    StatusCode::FOUND
                };
                logger
                    .debug_builder("redirecting")
                    .field("kind", err.kind())
                    .field("location", location.clone())
                    .field_u64("status", u64::from(status.as_u16()))
                    .emit();
                (
                    PipelineState::Redirected,
                    SsrResponse::redirect(status, location),
                )
            }
            SsrError::NotFound { path } => {
                logger
                    .debug_builder("no page for path")
                    .field("kind", err.kind())
                    .field("path", path.clone())
                    .emit();
                (
                    PipelineState::NotFound,
                    SsrResponse::html(
                        StatusCode::NOT_FOUND,
                        ResponseBody::Full(ErrorPage::body_for(&err, false)),
                    ),
                )
            }
            _ => {
                logger
                    .error_builder("ssr request failed")
                    .field("kind", err.kind())
                    .field("error", err.detail())
                    .emit();
                (
                    PipelineState::Failed,
                    SsrResponse::html(
                        err.status(),
                        ResponseBody::Full(ErrorPage::body_for(&err, self.config.exposes_errors())),
                    ),
                )
            }
        };

        advance(&mut tracker, state);
        let metrics = metrics.finalize(Some(response.status.as_u16()), state);
        logger
            .debug_builder("request complete")
            .field("outcome", metrics.outcome.clone())
            .field("metrics", metrics.to_json())
            .emit();
        response
    }
}

impl std::fmt::Debug for SsrMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsrMiddleware")
            .field("config", &self.config)
            .field("routes", &self.resolver.tree().patterns().collect::<Vec<_>>())
            .field("body_buffer", &self.body_buffer)
            .finish()
    }
}

fn advance(tracker: &mut PipelineTracker, next: PipelineState) {
    if let Err(err) = tracker.transition(next) {
        tracing::warn!(error = %err, "pipeline transition rejected");
    }
}

struct Observers(Vec<Arc<dyn LifecycleObserver>>);

impl LifecycleObserver for Observers {
    fn on_transition(&self, from: PipelineState, to: PipelineState, elapsed: Duration) {
        for observer in &self.0 {
            observer.on_transition(from, to, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_observability::MemorySink;
    use folio_render::{view_fn, Fragment};
    use folio_router::{loader_fn, LoaderResult, RouteNode, RouteTree};
    use folio_template::StaticSource;
    use std::sync::Mutex;

    const SHELL: &str = concat!(
        "<html><head><!--app-head--></head><body>",
        "<div id=\"root\"><!--app-html--></div>",
        "<!--app-initial-state--><!--app-initial-valtio-state--><!--app-data-->",
        "</body></html>"
    );

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PipelineState>>);

    impl LifecycleObserver for Recorder {
        fn on_transition(&self, _from: PipelineState, to: PipelineState, _elapsed: Duration) {
            self.0.lock().unwrap().push(to);
        }
    }

    fn middleware(config: SsrConfig) -> SsrMiddleware {
        let routes = RouteTree::new(vec![
            RouteNode::new("/").with_view(view_fn(|_, _| Ok(Fragment::leaf("<p>home</p>")))),
            RouteNode::new("/private").with_loader(loader_fn(|_| async {
                LoaderResult::redirect("/login")
            })),
            RouteNode::new("/broken").with_loader(loader_fn(|_| async {
                LoaderResult::error(anyhow::anyhow!("db down"))
            })),
        ]);
        let templates = Arc::new(folio_template::ProdTemplateProvider::new(StaticSource::new(
            SHELL,
        )));
        SsrMiddleware::new(config, templates, routes)
    }

    // === Dispatch Tests ===

    #[tokio::test]
    async fn test_api_path_bypasses() {
        let mw = middleware(SsrConfig::production());
        match mw.dispatch(RenderRequest::new("/api/users?x=1")).await {
            Dispatch::Bypass(request) => assert_eq!(request.original_url(), "/api/users?x=1"),
            Dispatch::Response(_) => panic!("api path was rendered"),
        }
    }

    #[tokio::test]
    async fn test_page_is_rendered() {
        let recorder = Arc::new(Recorder::default());
        let mw = middleware(SsrConfig::production()).with_observer(recorder.clone());

        let response = mw.handle(RenderRequest::new("/")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("cache-control"), Some(crate::NO_STORE));
        let html = response.into_string().await;
        assert!(html.contains("<div id=\"root\"><p>home</p></div>"));

        tokio::task::yield_now().await;
        let states = recorder.0.lock().unwrap().clone();
        assert_eq!(
            states,
            vec![
                PipelineState::Routing,
                PipelineState::Loading,
                PipelineState::Rendering,
                PipelineState::Streaming,
                PipelineState::Done,
            ]
        );
    }

    // === Failure Mapping Tests ===

    #[tokio::test]
    async fn test_redirect_has_no_body() {
        let response = middleware(SsrConfig::production())
            .handle(RenderRequest::new("/private"))
            .await;
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.header("location"), Some("/login"));
        assert!(response.into_string().await.is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let logs = MemorySink::new();
        let response = middleware(SsrConfig::production())
            .with_log_sink(logs.clone())
            .handle(RenderRequest::new("/nope"))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.into_string().await.contains("Page Not Found"));
        assert_eq!(logs.with_kind("not_found").len(), 1);
    }

    #[tokio::test]
    async fn test_loader_failure_is_generic_in_production() {
        let logs = MemorySink::new();
        let response = middleware(SsrConfig::production())
            .with_log_sink(logs.clone())
            .handle(RenderRequest::new("/broken"))
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.into_string().await, crate::GENERIC_ERROR_BODY);

        let failures = logs.with_kind("render_failure");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].field("error").unwrap().contains("db down"));
        assert_eq!(failures[0].url.as_deref(), Some("/broken"));
    }

    #[tokio::test]
    async fn test_production_ignores_expose_flag() {
        let response = middleware(SsrConfig::production().with_expose_errors(true))
            .handle(RenderRequest::new("/broken"))
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_string().await;
        assert_eq!(body, crate::GENERIC_ERROR_BODY);
        assert!(!body.contains("db down"));
    }

    #[tokio::test]
    async fn test_loader_failure_detailed_in_development() {
        let response = middleware(SsrConfig::development())
            .handle(RenderRequest::new("/broken"))
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_string().await;
        assert!(body.contains("loader for /broken failed"));
        assert!(body.contains("db down"));
    }
}
