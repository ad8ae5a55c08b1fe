//! Pipeline state machine and request timing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// States a single SSR pipeline run moves through.
///
/// ```text
/// Idle -> Routing -> Loading -> Rendering -> Streaming -> Done
///            |          |                       |
///            +----------+--> Redirected         +--> FailedPartial
///                       +--> NotFound
///                       +--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Request accepted, nothing done yet.
    Idle,
    /// Matching the URL against the route tree.
    Routing,
    /// Running the matched chain's loaders.
    Loading,
    /// Driving the UI tree to markup.
    Rendering,
    /// Bytes are being written to the client.
    Streaming,
    /// Response completed normally.
    Done,
    /// A loader redirected.
    Redirected,
    /// No route matched or a loader signalled not found.
    NotFound,
    /// Failed before any byte was written.
    Failed,
    /// Failed after the head was written; response still terminated.
    FailedPartial,
}

impl PipelineState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Routing)
                | (Routing, Loading)
                | (Routing, Redirected | NotFound | Failed)
                | (Loading, Rendering)
                | (Loading, Redirected | NotFound | Failed)
                | (Rendering, Streaming)
                | (Rendering, Failed)
                | (Streaming, Done)
                | (Streaming, FailedPartial)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Done
                | PipelineState::Redirected
                | PipelineState::NotFound
                | PipelineState::Failed
                | PipelineState::FailedPartial
        )
    }

    /// Stable lowercase name, used as a log field.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Routing => "routing",
            PipelineState::Loading => "loading",
            PipelineState::Rendering => "rendering",
            PipelineState::Streaming => "streaming",
            PipelineState::Done => "done",
            PipelineState::Redirected => "redirected",
            PipelineState::NotFound => "not_found",
            PipelineState::Failed => "failed",
            PipelineState::FailedPartial => "failed_partial",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal pipeline transition {from} -> {to}")]
pub struct TransitionError {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called after every accepted transition.
    fn on_transition(&self, from: PipelineState, to: PipelineState, elapsed: Duration);
}

/// Tracks one pipeline run's state and reports transitions.
pub struct PipelineTracker {
    state: PipelineState,
    history: Vec<(PipelineState, Duration)>,
    timing: TimingContext,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl PipelineTracker {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![(PipelineState::Idle, Duration::ZERO)],
            timing: TimingContext::new(),
            observer: None,
        }
    }

    /// Attach an observer notified on every transition.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// States visited so far with their offset from the start of the run.
    pub fn history(&self) -> &[(PipelineState, Duration)] {
        &self.history
    }

    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut TimingContext {
        &mut self.timing
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(&mut self, next: PipelineState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }

        let from = self.state;
        let elapsed = self.timing.elapsed();
        self.state = next;
        self.history.push((next, elapsed));
        self.timing.mark(next.as_str());

        if let Some(observer) = &self.observer {
            observer.on_transition(from, next, elapsed);
        }
        Ok(())
    }
}

impl Default for PipelineTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineTracker")
            .field("state", &self.state)
            .field("history", &self.history)
            .finish()
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark. Later marks with the same name overwrite earlier ones.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Offset of a named mark from the start.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time until the head segment was written.
    pub fn time_to_head(&self) -> Option<Duration> {
        self.since_start("head_sent")
    }

    /// Time until the renderer reported all-ready.
    pub fn time_to_all_ready(&self) -> Option<Duration> {
        self.since_start("all_ready")
    }

    /// Duration between two marks, if both were recorded in order.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        to.checked_duration_since(*from)
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}
