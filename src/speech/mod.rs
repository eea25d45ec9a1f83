//! Text-to-speech orchestration against the remote speech service.
//!
//! # Architecture
//!
//! ```text
//! SpeechOrchestrator::speak(text)
//!        │
//!        ├─ SessionManager::get_session()   memoized, de-duplicated
//!        ├─ SpeechApi::submit()             → request_id
//!        ├─ poll_job()                      ≤ max_attempts × interval
//!        │     pending* → completed | error | timed out
//!        └─ PlaybackSink::play(base64)      fire-and-forget
//! ```
//!
//! * [`SpeechApi`] / [`HttpSpeechApi`]: the wire protocol.
//! * [`SessionManager`]: one session per process.
//! * [`PollPolicy`] / [`poll_job`]: the bounded poll loop.
//! * [`SpeechOrchestrator`]: the whole job.
//! * [`PlaybackSink`] / [`RodioPlayback`]: audio output.

pub mod api;
pub mod job;
pub mod playback;
pub mod poll;
pub mod session;

#[cfg(test)]
mod mock;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use api::{ApiError, HttpSpeechApi, JobStatus, SpeechApi};
pub use job::{SpeakOutcome, SpeechError, SpeechOrchestrator};
pub use playback::{decode_audio, PlaybackSink, RodioPlayback};
pub use poll::{poll_job, JobPhase, PollAttempt, PollPolicy, SpeechJob};
pub use session::{SessionAcquisitionFailed, SessionId, SessionManager};

#[cfg(test)]
pub use mock::MockSpeechApi;
#[cfg(test)]
pub use playback::RecordingPlayback;
