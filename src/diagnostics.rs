//! Run-scoped logging sinks
//!
//! The crawl controller and the extraction engine never log through a global
//! logger directly. They receive a [`LogSink`] at construction, which lets a
//! run attach its own span and lets tests capture exactly what was reported.

use std::sync::{Arc, Mutex};
use tracing::Level;

/// Destination for diagnostics produced during a crawl or scrape run
pub trait LogSink: Send + Sync {
    /// Records a single event
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Forwards events to `tracing` inside a per-run span
#[derive(Debug, Clone)]
pub struct TracingSink {
    span: tracing::Span,
}

impl TracingSink {
    /// Creates a sink whose events carry the given phase and run identifier
    pub fn new(phase: &'static str, run_id: &str) -> Self {
        Self {
            span: tracing::info_span!("run", phase, run = %run_id),
        }
    }

    /// Shared handle, as taken by the controller and engine constructors
    pub fn shared(phase: &'static str, run_id: &str) -> Arc<dyn LogSink> {
        Arc::new(Self::new(phase, run_id))
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        let _entered = self.span.enter();
        match level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            Level::TRACE => tracing::trace!("{}", message),
        }
    }
}

/// A logged event kept by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Keeps every event in memory
///
/// Used by tests and by the run statistics, which count warnings.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at WARN level
    pub fn warnings(&self) -> Vec<String> {
        self.messages_at(Level::WARN)
    }

    /// Messages recorded at ERROR level
    pub fn errors(&self) -> Vec<String> {
        self.messages_at(Level::ERROR)
    }

    fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}

/// Fans each event out to two sinks
///
/// The binary pairs a [`TracingSink`] with a [`MemorySink`] so warnings are
/// both printed and counted for the run statistics.
pub struct TeeSink {
    first: Arc<dyn LogSink>,
    second: Arc<dyn LogSink>,
}

impl TeeSink {
    pub fn new(first: Arc<dyn LogSink>, second: Arc<dyn LogSink>) -> Self {
        Self { first, second }
    }
}

impl LogSink for TeeSink {
    fn log(&self, level: Level, message: &str) {
        self.first.log(level, message);
        self.second.log(level, message);
    }
}
