//! Streaming and blocking render modes.

use std::sync::Arc;

use async_trait::async_trait;
use folio_core::SsrConfig;
use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, oneshot};

use crate::outcome::AbortOnDrop;
use crate::{MarkupStream, RenderError, RenderOutcome, RenderScope, ViewChain};

/// Turns a loaded route chain into a [`RenderOutcome`].
///
/// Loaders have already run; `scope` carries the request's fresh query
/// cache and state. Returning `Err` means nothing has been produced yet.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, chain: ViewChain, scope: RenderScope) -> Result<RenderOutcome, RenderError>;
}

/// Renderer for the configured mode.
pub fn renderer_for(config: &SsrConfig) -> Arc<dyn Renderer> {
    if config.render.streaming {
        Arc::new(StreamingRenderer::new())
    } else {
        Arc::new(BlockingRenderer::new())
    }
}

/// Snapshot the request state into the outcome, then clear the query cache
/// so nothing can read it after this render.
fn finish(scope: &RenderScope, markup: MarkupStream) -> RenderOutcome {
    let query_state = scope.query().dehydrate();
    scope.query().clear();

    RenderOutcome::new(markup, scope.head().render())
        .with_query_state(query_state)
        .with_global_state(scope.global().clone())
        .with_store_state(scope.store().clone())
}

/// Renders each route segment on a background task.
///
/// The first segment is the shell: if it fails, `render` fails and nothing
/// is written. Later segments that fail appear as an `Err` item in the
/// markup stream. `render` resolves once every segment has finished, so
/// the head tags handed to the compositor are final.
///
/// Dropping the returned markup stream, or the `render` future before it
/// resolves, aborts the task.
#[derive(Debug, Clone, Default)]
pub struct StreamingRenderer;

impl StreamingRenderer {
    pub fn new() -> Self {
        Self
    }
}

type Chunk = Result<String, RenderError>;

async fn drive(
    chain: ViewChain,
    scope: RenderScope,
    chunks: mpsc::UnboundedSender<Chunk>,
    shell_ready: oneshot::Sender<Result<(), RenderError>>,
    all_ready: oneshot::Sender<()>,
) {
    let mut shell_ready = Some(shell_ready);
    let mut closes = Vec::new();

    for (route, data) in chain.routes() {
        let Some(view) = route.node().view() else {
            continue;
        };

        match view.render(&scope, data).await {
            Ok(fragment) => {
                let _ = chunks.send(Ok(fragment.open));
                closes.push(fragment.close);
                if let Some(ready) = shell_ready.take() {
                    tracing::debug!(route = %route.pattern(), "shell ready");
                    let _ = ready.send(Ok(()));
                }
            }
            Err(error) => {
                let err = RenderError::View {
                    route: route.pattern().to_string(),
                    error,
                };
                match shell_ready.take() {
                    Some(ready) => {
                        let _ = ready.send(Err(err));
                    }
                    None => {
                        let _ = chunks.send(Err(err));
                        let _ = all_ready.send(());
                    }
                }
                return;
            }
        }
    }

    if let Some(ready) = shell_ready.take() {
        let _ = ready.send(Ok(()));
    }
    for close in closes.into_iter().rev() {
        let _ = chunks.send(Ok(close));
    }
    let _ = all_ready.send(());
}

fn channel_stream(chunks: mpsc::UnboundedReceiver<Chunk>, guard: AbortOnDrop) -> MarkupStream {
    stream::unfold((chunks, guard), |(mut chunks, guard)| async move {
        let chunk = chunks.recv().await?;
        Some((chunk, (chunks, guard)))
    })
    .boxed()
}

#[async_trait]
impl Renderer for StreamingRenderer {
    async fn render(&self, chain: ViewChain, scope: RenderScope) -> Result<RenderOutcome, RenderError> {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (shell_tx, shell_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let task = tokio::spawn(drive(chain, scope.clone(), chunk_tx, shell_tx, ready_tx));
        let guard = AbortOnDrop(task.abort_handle());

        shell_rx.await.map_err(|_| RenderError::Aborted)??;
        ready_rx.await.map_err(|_| RenderError::Aborted)?;
        tracing::debug!(url = %scope.request().url, "all ready");

        Ok(finish(&scope, channel_stream(chunk_rx, guard)))
    }
}

/// Renders the whole chain in memory and emits it as a single chunk.
#[derive(Debug, Clone, Default)]
pub struct BlockingRenderer;

impl BlockingRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for BlockingRenderer {
    async fn render(&self, chain: ViewChain, scope: RenderScope) -> Result<RenderOutcome, RenderError> {
        let mut html = String::new();
        let mut closes = Vec::new();

        for (route, data) in chain.routes() {
            let Some(view) = route.node().view() else {
                continue;
            };
            let fragment = view
                .render(&scope, data)
                .await
                .map_err(|error| RenderError::View {
                    route: route.pattern().to_string(),
                    error,
                })?;
            html.push_str(&fragment.open);
            closes.push(fragment.close);
        }
        for close in closes.into_iter().rev() {
            html.push_str(&close);
        }

        Ok(finish(&scope, stream::iter([Ok(html)]).boxed()))
    }
}
