//! Observability infrastructure for the folio SSR pipeline.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped structured logging over `tracing`
//! - `MetricsCollector` / `RenderMetrics` - Per-request render timing
//! - `TracingObserver` - Pipeline transitions as trace events
//! - `init_tracing` - Subscriber setup for binaries

mod logging;
mod metrics;
mod subscriber;

pub use logging::*;
pub use metrics::*;
pub use subscriber::*;

// Re-export RequestId and TimingContext from folio-core for convenience
pub use folio_core::{RequestId, TimingContext};
