//! Speech job orchestration: session → submit → poll → playback.
//!
//! [`SpeechOrchestrator::speak`] runs one job end to end.  Every step is
//! strictly sequential and each failure mode maps to one [`SpeechError`]
//! variant, so callers (and tests) can tell a remote job error from a poll
//! timeout.

use std::sync::Arc;

use thiserror::Error;

use crate::config::SpeechConfig;
use crate::diagnostics::Diagnostics;
use crate::speech::api::{ApiError, SpeechApi};
use crate::speech::playback::PlaybackSink;
use crate::speech::poll::{poll_job, JobPhase, PollPolicy, SpeechJob};
use crate::speech::session::{SessionAcquisitionFailed, SessionId, SessionManager};

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Why a `speak` call produced no audio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// No session could be obtained.
    #[error(transparent)]
    SessionAcquisitionFailed(#[from] SessionAcquisitionFailed),

    /// A response was missing fields or was not JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Transport failure or non-success HTTP status while submitting or
    /// polling.
    #[error("speech request failed: {0}")]
    Request(ApiError),

    /// The service reported `error` for the job.
    #[error("speech job {request_id} failed on the server")]
    RemoteJobError { request_id: String },

    /// The attempt budget ran out before the job finished.
    #[error("speech job {request_id} still pending after {attempts} polls")]
    PollTimeout { request_id: String, attempts: u32 },
}

impl SpeechError {
    /// `true` when no terminal status was seen in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SpeechError::PollTimeout { .. })
    }
}

impl From<ApiError> for SpeechError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Malformed(msg) => SpeechError::MalformedResponse(msg),
            other => SpeechError::Request(other),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeakOutcome
// ---------------------------------------------------------------------------

/// Result of a `speak` call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// The input was empty; nothing was sent.
    Skipped,
    /// Audio was handed to the playback sink.
    Played { request_id: String, attempts: u32 },
}

// ---------------------------------------------------------------------------
// SpeechOrchestrator
// ---------------------------------------------------------------------------

/// Runs text-to-speech jobs against the remote service.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use page_reader::config::AppConfig;
/// use page_reader::diagnostics::{Diagnostics, LogSink};
/// use page_reader::speech::{HttpSpeechApi, RodioPlayback, SessionManager, SpeechApi, SpeechOrchestrator};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let diagnostics: Diagnostics = Arc::new(LogSink);
/// let api: Arc<dyn SpeechApi> = Arc::new(HttpSpeechApi::from_config(&config.speech));
/// let sessions = Arc::new(SessionManager::new(api.clone(), diagnostics.clone()));
/// let speech = SpeechOrchestrator::new(
///     api,
///     sessions,
///     Arc::new(RodioPlayback::new(diagnostics.clone())),
///     diagnostics,
///     &config.speech,
/// );
/// speech.speak("Moien!").await.unwrap();
/// # }
/// ```
pub struct SpeechOrchestrator {
    api: Arc<dyn SpeechApi>,
    sessions: Arc<SessionManager>,
    playback: Arc<dyn PlaybackSink>,
    diagnostics: Diagnostics,
    model: String,
    policy: PollPolicy,
    reacquire_on_rejection: bool,
}

impl SpeechOrchestrator {
    pub fn new(
        api: Arc<dyn SpeechApi>,
        sessions: Arc<SessionManager>,
        playback: Arc<dyn PlaybackSink>,
        diagnostics: Diagnostics,
        config: &SpeechConfig,
    ) -> Self {
        Self {
            api,
            sessions,
            playback,
            diagnostics,
            model: config.model.clone(),
            policy: PollPolicy::from(&config.poll),
            reacquire_on_rejection: config.reacquire_session_on_rejection,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Synthesize `text` and hand the audio to the playback sink.
    ///
    /// Empty or whitespace-only input returns [`SpeakOutcome::Skipped`]
    /// without touching the network.  There is no whole-job retry.
    pub async fn speak(&self, text: &str) -> Result<SpeakOutcome, SpeechError> {
        if text.trim().is_empty() {
            return Ok(SpeakOutcome::Skipped);
        }

        let session = self.sessions.get_session().await?;
        let request_id = self.submit(session, text).await?;

        let mut job = SpeechJob::submitted(request_id);
        poll_job(
            self.api.as_ref(),
            &mut job,
            self.policy,
            self.diagnostics.as_ref(),
        )
        .await?;

        self.diagnostics.info(&format!(
            "speech job {}: {} after {} poll(s)",
            job.request_id,
            job.phase.label(),
            job.attempts
        ));

        match (job.phase, job.audio) {
            (JobPhase::Completed, Some(audio)) => {
                self.playback.play(&audio);
                Ok(SpeakOutcome::Played {
                    request_id: job.request_id,
                    attempts: job.attempts,
                })
            }
            (JobPhase::Error, _) => Err(SpeechError::RemoteJobError {
                request_id: job.request_id,
            }),
            (_, _) => Err(SpeechError::PollTimeout {
                request_id: job.request_id,
                attempts: job.attempts,
            }),
        }
    }

    /// Submit the job, optionally re-acquiring the session once if the
    /// service rejects the cached one.
    async fn submit(&self, session: SessionId, text: &str) -> Result<String, SpeechError> {
        self.diagnostics.info(&format!(
            "speech: submitting {} chars (model {})",
            text.chars().count(),
            self.model
        ));

        match self.api.submit(session.as_str(), text, &self.model).await {
            Ok(request_id) => {
                self.diagnostics
                    .info(&format!("speech: submitted as {request_id}"));
                Ok(request_id)
            }
            Err(e) if self.reacquire_on_rejection && e.is_session_rejection() => {
                self.diagnostics.warn(&format!(
                    "speech: submission rejected ({e}), retrying with a new session"
                ));
                self.sessions.invalidate();
                let session = self.sessions.get_session().await?;
                let request_id = self
                    .api
                    .submit(session.as_str(), text, &self.model)
                    .await?;
                self.diagnostics
                    .info(&format!("speech: submitted as {request_id}"));
                Ok(request_id)
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
