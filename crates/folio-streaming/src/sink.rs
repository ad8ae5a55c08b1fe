//! Order-enforcing response sink.

use std::fmt::Display;

use folio_core::TimingContext;
use futures::{Sink, SinkExt};

use crate::StreamError;

/// Where a response is in its head, body, tail sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Nothing written yet; status and headers may still change.
    Initial,
    /// Head segment written; status and headers are committed.
    HeadSent,
    /// Tail written and the sink closed.
    Completed,
}

/// Response sink that only accepts writes in document order.
///
/// Generic over any `Sink<Vec<u8>>`, so the same code writes to a channel
/// feeding an HTTP body or to an in-memory buffer in tests.
pub struct StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    inner: S,
    state: SinkState,
    timing: TimingContext,
    bytes_written: usize,
    chunks: usize,
}

impl<S, E> StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    pub fn new(sink: S) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing: TimingContext::new(),
            bytes_written: 0,
            chunks: 0,
        }
    }

    /// Write the head segment. Must come first, exactly once.
    pub async fn send_head(&mut self, html: &str) -> Result<(), StreamError> {
        match self.state {
            SinkState::Initial => {}
            SinkState::HeadSent => return Err(StreamError::HeadAlreadySent),
            SinkState::Completed => return Err(StreamError::Completed),
        }

        self.write(html).await?;
        self.timing.mark("head_sent");
        self.state = SinkState::HeadSent;
        Ok(())
    }

    /// Forward one markup chunk.
    pub async fn send_chunk(&mut self, html: &str) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.write(html).await?;
        self.chunks += 1;
        Ok(())
    }

    /// Write the tail segment and close the sink.
    pub async fn send_tail(&mut self, html: &str) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.write(html).await?;
        self.inner
            .close()
            .await
            .map_err(|e| StreamError::Disconnected(e.to_string()))?;
        self.timing.mark("complete");
        self.state = SinkState::Completed;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        match self.state {
            SinkState::Initial => Err(StreamError::HeadNotSent),
            SinkState::HeadSent => Ok(()),
            SinkState::Completed => Err(StreamError::Completed),
        }
    }

    async fn write(&mut self, html: &str) -> Result<(), StreamError> {
        self.inner
            .send(html.as_bytes().to_vec())
            .await
            .map_err(|e| StreamError::Disconnected(e.to_string()))?;
        self.bytes_written += html.len();
        Ok(())
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Whether status and headers can no longer change.
    pub fn is_committed(&self) -> bool {
        self.state != SinkState::Initial
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Markup chunks forwarded between head and tail.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// Consume the sink and return the inner value.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::StreamExt;

    fn buffer() -> StreamingSink<Vec<Vec<u8>>, std::convert::Infallible> {
        StreamingSink::new(Vec::new())
    }

    // === Ordering Tests ===

    #[tokio::test]
    async fn test_head_body_tail_order() {
        let mut sink = buffer();
        sink.send_head("<head>").await.unwrap();
        assert!(sink.is_committed());
        sink.send_chunk("<p>").await.unwrap();
        sink.send_tail("</html>").await.unwrap();

        assert_eq!(sink.state(), SinkState::Completed);
        assert_eq!(sink.bytes_written(), 16);
        assert_eq!(sink.chunks(), 1);
        assert!(sink.timing().time_to_head().is_some());

        let written: Vec<String> = sink
            .into_inner()
            .into_iter()
            .map(|b| String::from_utf8(b).unwrap())
            .collect();
        assert_eq!(written, vec!["<head>", "<p>", "</html>"]);
    }

    #[tokio::test]
    async fn test_chunk_before_head_rejected() {
        let mut sink = buffer();
        assert!(matches!(
            sink.send_chunk("<p>").await,
            Err(StreamError::HeadNotSent)
        ));
        assert!(matches!(
            sink.send_tail("</html>").await,
            Err(StreamError::HeadNotSent)
        ));
    }

    #[tokio::test]
    async fn test_writes_after_completion_rejected() {
        let mut sink = buffer();
        sink.send_head("h").await.unwrap();
        sink.send_tail("t").await.unwrap();
        assert!(matches!(sink.send_chunk("x").await, Err(StreamError::Completed)));
        assert!(matches!(sink.send_head("h").await, Err(StreamError::Completed)));
    }

    #[tokio::test]
    async fn test_second_head_rejected() {
        let mut sink = buffer();
        sink.send_head("h").await.unwrap();
        assert!(matches!(
            sink.send_head("h").await,
            Err(StreamError::HeadAlreadySent)
        ));
    }

    // === Disconnect Tests ===

    #[tokio::test]
    async fn test_dropped_receiver_is_disconnect() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(1);
        drop(rx);
        let mut sink = StreamingSink::new(tx);
        assert!(matches!(
            sink.send_head("h").await,
            Err(StreamError::Disconnected(_))
        ));
        assert_eq!(sink.state(), SinkState::Initial);
    }

    #[tokio::test]
    async fn test_channel_sink_closes_on_tail() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(4);
        let mut sink = StreamingSink::new(tx);
        sink.send_head("h").await.unwrap();
        sink.send_tail("t").await.unwrap();
        drop(sink);

        let received: Vec<Vec<u8>> = rx.collect().await;
        assert_eq!(received, vec![b"h".to_vec(), b"t".to_vec()]);
    }
}
