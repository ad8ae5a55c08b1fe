//! Head, body, tail composition of one response.

use std::fmt::Display;

use folio_core::{PipelineState, SsrError};
use folio_observability::{MetricsCollector, RenderMetrics, StructuredLogger};
use folio_render::{MarkupStream, RenderOutcome};
use futures::{Sink, StreamExt};

use crate::{StreamError, StreamingSink, TemplateSplit};

/// Everything written for one response.
///
/// Head and tail are rendered before the first byte is written, so a
/// state serialization failure still surfaces as an ordinary render
/// failure with a real status code.
pub struct Document {
    pub head: String,
    pub markup: MarkupStream,
    pub tail: String,
}

impl Document {
    pub fn assemble(split: &TemplateSplit, outcome: RenderOutcome) -> Result<Self, StreamError> {
        let scripts = outcome.state_scripts()?;
        Ok(Self {
            head: split.render_head(&outcome.head_tags),
            tail: split.render_tail(&scripts),
            markup: outcome.markup,
        })
    }
}

/// How a composed response ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeStatus {
    /// Head, every chunk, and tail were written.
    Completed,
    /// The markup stream failed after the head; the tail was still written.
    PartialFailure { message: String },
    /// The client went away; the render was abandoned.
    Disconnected { message: String },
}

impl ComposeStatus {
    /// Terminal pipeline state for this result.
    pub fn pipeline_state(&self) -> PipelineState {
        match self {
            ComposeStatus::Completed => PipelineState::Done,
            ComposeStatus::PartialFailure { .. } | ComposeStatus::Disconnected { .. } => {
                PipelineState::FailedPartial
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposeReport {
    pub status: ComposeStatus,
    pub metrics: RenderMetrics,
}

/// Writes a [`Document`] to a [`StreamingSink`].
///
/// Write order is always head, then markup chunks as they arrive, then
/// tail. A markup error after the head cannot change the committed
/// status, so it is logged and the tail is written anyway. A failed write
/// means the client disconnected: the markup stream is dropped, which
/// aborts the render behind it.
pub struct StreamCompositor {
    logger: StructuredLogger,
    metrics: MetricsCollector,
    status_code: u16,
}

impl StreamCompositor {
    pub fn new(logger: StructuredLogger, metrics: MetricsCollector) -> Self {
        Self {
            logger,
            metrics,
            status_code: 200,
        }
    }

    pub async fn compose<S, E>(
        mut self,
        document: Document,
        sink: &mut StreamingSink<S, E>,
    ) -> ComposeReport
    where
        S: Sink<Vec<u8>, Error = E> + Unpin,
        E: Display,
    {
        let Document {
            head,
            mut markup,
            tail,
        } = document;

        if let Err(err) = sink.send_head(&head).await {
            return self.disconnected(err, markup);
        }
        self.metrics.record_head_sent(head.len());

        let mut failure = None;
        while let Some(chunk) = markup.next().await {
            match chunk {
                Ok(html) if html.is_empty() => {}
                Ok(html) => {
                    if let Err(err) = sink.send_chunk(&html).await {
                        return self.disconnected(err, markup);
                    }
                    self.metrics.record_chunk(html.len());
                }
                Err(err) => {
                    failure = Some(SsrError::PartialStreamFailure {
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }
        drop(markup);

        if let Some(failure) = &failure {
            self.logger
                .error_builder("markup stream failed after head was sent")
                .field("kind", failure.kind())
                .field("error", failure.to_string())
                .field_u64("bytes_written", sink.bytes_written() as u64)
                .emit();
        }

        if let Err(err) = sink.send_tail(&tail).await {
            return self.disconnected(err, futures::stream::empty().boxed());
        }
        self.metrics.record_tail(tail.len());

        let status = match failure {
            Some(SsrError::PartialStreamFailure { message }) => {
                ComposeStatus::PartialFailure { message }
            }
            _ => ComposeStatus::Completed,
        };
        self.finish(status)
    }

    fn disconnected(self, err: StreamError, markup: MarkupStream) -> ComposeReport {
        drop(markup);
        self.logger
            .warn_builder("client disconnected, render aborted")
            .field("kind", "client_disconnected")
            .field("error", err.to_string())
            .emit();
        self.finish(ComposeStatus::Disconnected {
            message: err.to_string(),
        })
    }

    fn finish(self, status: ComposeStatus) -> ComposeReport {
        let metrics = self
            .metrics
            .finalize(Some(self.status_code), status.pipeline_state());
        self.logger
            .debug_builder("response complete")
            .field("outcome", metrics.outcome.clone())
            .field_u64("bytes_written", metrics.bytes_written as u64)
            .field_u64("chunks", metrics.chunks as u64)
            .emit();
        ComposeReport { status, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Cookies, RequestId};
    use folio_observability::MemorySink;
    use folio_render::RenderError;
    use folio_state::GlobalState;
    use futures::channel::mpsc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const SHELL: &str = concat!(
        "<html><head><!--app-head--></head><body>",
        "<div id=\"root\"><!--app-html--></div>",
        "<!--app-initial-state--><!--app-initial-valtio-state--><!--app-data-->",
        "</body></html>"
    );

    fn compositor(sink: Arc<MemorySink>) -> StreamCompositor {
        let id = RequestId::from_string("req-1");
        StreamCompositor::new(
            StructuredLogger::new(id.clone()).with_sink(sink),
            MetricsCollector::new(id),
        )
    }

    fn document(chunks: Vec<Result<String, RenderError>>) -> Document {
        let outcome = RenderOutcome::from_chunks(chunks, "<title>T</title>")
            .with_global_state(GlobalState::seed(&Cookies::new()));
        Document::assemble(&TemplateSplit::new(SHELL).unwrap(), outcome).unwrap()
    }

    fn body(sink: StreamingSink<Vec<Vec<u8>>, std::convert::Infallible>) -> String {
        sink.into_inner()
            .into_iter()
            .map(|b| String::from_utf8(b).unwrap())
            .collect()
    }

    // === Compose Tests ===

    #[tokio::test]
    async fn test_writes_head_markup_tail() {
        let logs = MemorySink::new();
        let mut sink = StreamingSink::new(Vec::new());
        let report = compositor(logs)
            .compose(
                document(vec![Ok("<main>".into()), Ok("</main>".into())]),
                &mut sink,
            )
            .await;

        assert_eq!(report.status, ComposeStatus::Completed);
        assert_eq!(report.metrics.chunks, 2);
        assert_eq!(report.metrics.outcome, "done");

        let html = body(sink);
        assert!(html.starts_with("<html><head><title>T</title></head>"));
        assert!(html.contains("<div id=\"root\"><main></main></div>"));
        assert!(html.contains("<script>window.__INITIAL_STATE__ = "));
        assert!(!html.contains("<!--app-"));
    }

    #[tokio::test]
    async fn test_stream_error_still_writes_tail() {
        let logs = MemorySink::new();
        let mut sink = StreamingSink::new(Vec::new());
        let report = compositor(logs.clone())
            .compose(
                document(vec![
                    Ok("<main>".into()),
                    Err(RenderError::Aborted),
                    Ok("never".into()),
                ]),
                &mut sink,
            )
            .await;

        assert!(matches!(report.status, ComposeStatus::PartialFailure { .. }));
        assert_eq!(report.metrics.outcome, "failed_partial");
        assert_eq!(sink.state(), crate::SinkState::Completed);

        let html = body(sink);
        assert!(!html.contains("never"));
        assert!(html.ends_with("</body></html>"));
        assert!(html.contains("window.__INITIAL_STATE__"));
        assert_eq!(logs.with_kind("partial_stream_failure").len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_drops_markup() {
        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let flag = Flag(dropped.clone());
        let markup = futures::stream::pending::<Result<String, RenderError>>()
            .map(move |item| {
                let _keep = &flag;
                item
            })
            .boxed();

        let (tx, rx) = mpsc::channel::<Vec<u8>>(1);
        drop(rx);
        let mut sink = StreamingSink::new(tx);
        let logs = MemorySink::new();

        let report = compositor(logs.clone())
            .compose(
                Document {
                    head: "<head>".into(),
                    markup,
                    tail: "</html>".into(),
                },
                &mut sink,
            )
            .await;

        assert!(matches!(report.status, ComposeStatus::Disconnected { .. }));
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(logs.with_kind("client_disconnected").len(), 1);
    }
}
