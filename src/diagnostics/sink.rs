//! The [`DiagnosticsSink`] trait and the `log`-backed implementation.

use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    /// The matching `log` crate level.
    pub fn as_log_level(self) -> log::Level {
        match self {
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }

    /// Upper-case tag used by the log panel.
    pub fn label(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DiagnosticsSink trait
// ---------------------------------------------------------------------------

/// Observer for leveled diagnostic messages.
///
/// Implementations must be cheap and infallible: callers record from inside
/// async tasks and never check for errors.
pub trait DiagnosticsSink: Send + Sync {
    /// Append one entry.
    fn record(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

// Compile-time assertion: Arc<dyn DiagnosticsSink> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Arc<dyn DiagnosticsSink>) {}
};

/// Shared handle passed to every component that reports diagnostics.
pub type Diagnostics = Arc<dyn DiagnosticsSink>;

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

/// Forwards every entry to the `log` facade under the `page_reader` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: "page_reader", level.as_log_level(), "{message}");
    }
}

// ---------------------------------------------------------------------------
// RecordingSink  (test-only)
// ---------------------------------------------------------------------------

/// Test double that keeps every entry in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    entries: std::sync::Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of messages containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| m.contains(needle))
            .count()
    }
}

#[cfg(test)]
impl DiagnosticsSink for RecordingSink {
    fn record(&self, level: Level, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}
