//! Diagnostics: timestamped, leveled event log for observability.
//!
//! Every stage (session, speech job, OCR) reports what it is doing through a
//! [`DiagnosticsSink`].  The sink is a side channel: recording never fails,
//! never blocks on I/O, and never changes control flow.
//!
//! * [`LogSink`] forwards entries to the `log` facade (and so to
//!   `env_logger`).
//! * [`DiagnosticsLog`] additionally keeps a bounded ring of [`Entry`]s that
//!   the UI log panel renders each frame.

pub mod ring;
pub mod sink;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use ring::{DiagnosticsLog, Entry};
pub use sink::{Diagnostics, DiagnosticsSink, Level, LogSink};

#[cfg(test)]
pub use sink::RecordingSink;
