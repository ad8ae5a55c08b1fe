//! Request-scoped structured logging on top of `tracing`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use folio_core::RequestId;
use serde::Serialize;

/// Severity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One emitted record, as handed to a [`LogSink`].
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub request_id: String,
    /// Request URL as received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Matched route pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// RFC 3339 wall-clock time.
    pub timestamp: String,
    /// Microseconds since the logger was created.
    pub elapsed_us: u64,
    /// Extra key/values, e.g. `kind`.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// `[LEVEL] message (Nus) | k=v ...`, for terminals.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {} ({}us)", self.level, self.message, self.elapsed_us);

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            s.push_str(&fields.join(" "));
        }

        s
    }

    /// Get a string field by name.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Secondary destination for log entries, alongside `tracing`.
pub trait LogSink: Send + Sync {
    fn record(&self, entry: &LogEntry);
}

/// Sink that keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Entries whose `kind` field equals `kind`.
    pub fn with_kind(&self, kind: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.field("kind") == Some(kind))
            .collect()
    }
}

impl LogSink for MemorySink {
    fn record(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

/// Attaches the request id, url and route to every record it emits.
///
/// Every entry carries the request id, URL, a wall-clock timestamp and
/// the elapsed time since the logger was created. Entries are emitted as
/// `tracing` events and, when configured, copied to a [`LogSink`].
#[derive(Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    url: Option<String>,
    route: Option<String>,
    start_time: std::time::Instant,
    min_level: LogLevel,
    sink: Option<Arc<dyn LogSink>>,
}

impl fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("request_id", &self.request_id)
            .field("url", &self.url)
            .field("route", &self.route)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl StructuredLogger {
    /// Logger for one request.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            url: None,
            route: None,
            start_time: std::time::Instant::now(),
            min_level: LogLevel::Trace,
            sink: None,
        }
    }

    /// Set the request URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the route pattern.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Drop records below `level`.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Copy every entry to `sink` as well.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Update the route once it is known.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, BTreeMap::new());
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, BTreeMap::new());
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, BTreeMap::new());
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, BTreeMap::new());
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, BTreeMap::new());
    }

    fn log(&self, level: LogLevel, message: &str, fields: BTreeMap<String, serde_json::Value>) {
        if level < self.min_level {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.to_string(),
            url: self.url.clone(),
            route: self.route.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            elapsed_us: self.elapsed_us(),
            fields,
        };

        emit(&entry);

        if let Some(sink) = &self.sink {
            sink.record(&entry);
        }
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Microseconds since the request started.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }
}

fn emit(entry: &LogEntry) {
    let url = entry.url.as_deref().unwrap_or_default();
    let route = entry.route.as_deref().unwrap_or_default();
    let kind = entry.field("kind").unwrap_or_default();
    let fields = serde_json::Value::Object(
        entry
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );

    macro_rules! event {
        ($mac:ident) => {
            tracing::$mac!(
                request_id = %entry.request_id,
                url,
                route,
                kind,
                timestamp = %entry.timestamp,
                elapsed_us = entry.elapsed_us,
                fields = %fields,
                "{}",
                entry.message
            )
        };
    }

    match entry.level {
        LogLevel::Trace => event!(trace),
        LogLevel::Debug => event!(debug),
        LogLevel::Info => event!(info),
        LogLevel::Warn => event!(warn),
        LogLevel::Error => event!(error),
    }
}

/// Accumulates fields for one record; nothing is logged until `emit`.
pub struct LogBuilder<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    pub fn new(logger: &'a StructuredLogger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a boolean field.
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Record `duration` as whole milliseconds.
    pub fn duration_ms(mut self, key: &str, duration: std::time::Duration) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(duration.as_millis() as u64));
        self
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

impl StructuredLogger {
    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Info, message)
    }

    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Warn, message)
    }

    pub fn error_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Error, message)
    }

    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Debug, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> (StructuredLogger, Arc<MemorySink>) {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(RequestId::from_string("req-1"))
            .with_url("/detail/7")
            .with_sink(sink.clone());
        (logger, sink)
    }

    // === StructuredLogger Tests ===

    #[test]
    fn test_entries_carry_request_context() {
        let (logger, sink) = logger();
        logger.info("rendered");

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request_id, "req-1");
        assert_eq!(entries[0].url.as_deref(), Some("/detail/7"));
        assert!(chrono::DateTime::parse_from_rfc3339(&entries[0].timestamp).is_ok());
    }

    #[test]
    fn test_min_level_filters() {
        let (logger, sink) = logger();
        let logger = logger.with_min_level(LogLevel::Warn);
        logger.debug("skipped");
        logger.warn("kept");
        assert_eq!(sink.entries().len(), 1);
        assert_eq!(sink.entries()[0].level, LogLevel::Warn);
    }

    // === LogBuilder Tests ===

    #[test]
    fn test_builder_fields() {
        let (logger, sink) = logger();
        logger
            .error_builder("render timed out")
            .field("kind", "render_timeout")
            .field_u64("deadline_ms", 50)
            .emit();

        let timeouts = sink.with_kind("render_timeout");
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts[0].level, LogLevel::Error);
        assert_eq!(timeouts[0].fields["deadline_ms"], serde_json::json!(50));
        assert!(sink.with_kind("render_failure").is_empty());
    }

    // === LogEntry Format Tests ===

    #[test]
    fn test_entry_formats() {
        let (logger, sink) = logger();
        logger.info_builder("done").field("status", "200").emit();
        let entry = &sink.entries()[0];

        let json: serde_json::Value = serde_json::from_str(&entry.to_json()).unwrap();
        assert_eq!(json["level"], "info");
        assert_eq!(json["status"], "200");

        let human = entry.to_human();
        assert!(human.starts_with("[INFO] done"));
        assert!(human.contains("status=\"200\""));
    }
}
