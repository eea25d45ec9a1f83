//! Bounded in-memory diagnostics log for the UI panel.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Local};

use super::sink::{DiagnosticsSink, Level, LogSink};

/// One timestamped diagnostic entry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub at: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl Entry {
    /// `HH:MM:SS` rendering of the timestamp.
    pub fn time_label(&self) -> String {
        self.at.format("%H:%M:%S").to_string()
    }
}

/// Ring buffer of the most recent `capacity` entries.
///
/// Every entry is also forwarded to [`LogSink`] so the terminal log and the
/// UI panel show the same stream.  The lock is only held for the push; a
/// poisoned lock is recovered rather than propagated.
pub struct DiagnosticsLog {
    entries: Mutex<VecDeque<Entry>>,
    capacity: usize,
}

impl DiagnosticsLog {
    /// Create a log that keeps at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<Entry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl DiagnosticsSink for DiagnosticsLog {
    fn record(&self, level: Level, message: &str) {
        LogSink.record(level, message);

        let entry = Entry {
            at: Local::now(),
            level,
            message: message.to_string(),
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}
