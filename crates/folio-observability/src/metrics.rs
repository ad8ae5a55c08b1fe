//! Per-request render timing metrics.

use std::time::{Duration, Instant};

use folio_core::{LifecycleObserver, PipelineState, RequestId};
use serde::{Deserialize, Serialize};

/// Render metrics for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMetrics {
    /// Id of the request these numbers belong to.
    pub request_id: String,
    /// Matched route pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Time until the renderer reported all-ready (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_all_ready_us: Option<u64>,
    /// Time until the head segment was written (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_head_us: Option<u64>,
    /// Total request duration (microseconds).
    pub total_duration_us: u64,
    /// Body bytes written to the client.
    pub bytes_written: usize,
    /// Markup chunks forwarded.
    pub chunks: usize,
    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Final pipeline state.
    pub outcome: String,
}

/// Collector for render metrics.
#[derive(Debug)]
pub struct MetricsCollector {
    request_id: RequestId,
    route: Option<String>,
    start: Instant,
    all_ready: Option<Instant>,
    head_sent: Option<Instant>,
    bytes_written: usize,
    chunks: usize,
}

impl MetricsCollector {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            start: Instant::now(),
            all_ready: None,
            head_sent: None,
            bytes_written: 0,
            chunks: 0,
        }
    }

    /// Set route pattern.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    /// Record the renderer reaching all-ready.
    pub fn record_all_ready(&mut self) {
        self.all_ready.get_or_insert_with(Instant::now);
    }

    /// Record the head segment leaving the process.
    pub fn record_head_sent(&mut self, bytes: usize) {
        self.head_sent.get_or_insert_with(Instant::now);
        self.bytes_written += bytes;
    }

    /// Record a forwarded markup chunk.
    pub fn record_chunk(&mut self, bytes: usize) {
        self.chunks += 1;
        self.bytes_written += bytes;
    }

    /// Record the tail segment.
    pub fn record_tail(&mut self, bytes: usize) {
        self.bytes_written += bytes;
    }

    /// Finalize and return the metrics.
    pub fn finalize(self, status_code: Option<u16>, outcome: PipelineState) -> RenderMetrics {
        let since = |t: Instant| t.duration_since(self.start).as_micros() as u64;

        RenderMetrics {
            request_id: self.request_id.to_string(),
            route: self.route.clone(),
            time_to_all_ready_us: self.all_ready.map(since),
            time_to_head_us: self.head_sent.map(since),
            total_duration_us: self.start.elapsed().as_micros() as u64,
            bytes_written: self.bytes_written,
            chunks: self.chunks,
            status_code,
            outcome: outcome.to_string(),
        }
    }

    /// Get time-to-head so far.
    pub fn time_to_head(&self) -> Option<Duration> {
        self.head_sent.map(|t| t.duration_since(self.start))
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Get total elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl RenderMetrics {
    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Request: {} [{}]", self.request_id, self.outcome));

        if let Some(route) = &self.route {
            lines.push(format!("  Route: {}", route));
        }

        if let Some(ready) = self.time_to_all_ready_us {
            lines.push(format!(
                "  Time to all-ready: {}us ({:.2}ms)",
                ready,
                ready as f64 / 1000.0
            ));
        }

        if let Some(head) = self.time_to_head_us {
            lines.push(format!(
                "  Time to head: {}us ({:.2}ms)",
                head,
                head as f64 / 1000.0
            ));
        }

        lines.push(format!(
            "  Total: {}us ({:.2}ms)",
            self.total_duration_us,
            self.total_duration_us as f64 / 1000.0
        ));
        lines.push(format!(
            "  Body: {} bytes in {} chunks",
            self.bytes_written, self.chunks
        ));

        if let Some(status) = self.status_code {
            lines.push(format!("  Status: {}", status));
        }

        lines.join("\n")
    }
}

/// Reports pipeline transitions as `debug` trace events.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    request_id: RequestId,
}

impl TracingObserver {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }
}

impl LifecycleObserver for TracingObserver {
    fn on_transition(&self, from: PipelineState, to: PipelineState, elapsed: Duration) {
        tracing::debug!(
            request_id = %self.request_id,
            from = from.as_str(),
            to = to.as_str(),
            elapsed_us = elapsed.as_micros() as u64,
            "pipeline transition"
        );
    }
}
