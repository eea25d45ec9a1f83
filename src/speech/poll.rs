//! Bounded, fixed-interval polling of a submitted speech job.
//!
//! The job itself is a small state machine:
//!
//! ```text
//! Submitted ──poll──▶ Pending ──poll──▶ Pending … ──▶ Completed
//!                                              └────▶ Error
//! ```
//!
//! [`PollPolicy`] is an orthogonal budget guard: once `max_attempts` status
//! requests have been made without reaching `Completed` or `Error`, the job
//! becomes `TimedOut`.  The two failure exits stay distinct.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::PollConfig;
use crate::diagnostics::DiagnosticsSink;
use crate::speech::api::{ApiError, JobStatus, SpeechApi};

// ---------------------------------------------------------------------------
// PollPolicy
// ---------------------------------------------------------------------------

/// How many status requests to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: config.interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// JobPhase / SpeechJob
// ---------------------------------------------------------------------------

/// Lifecycle of one synthesis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Submitted,
    Pending,
    Completed,
    Error,
    TimedOut,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Error | JobPhase::TimedOut)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobPhase::Submitted => "submitted",
            JobPhase::Pending => "pending",
            JobPhase::Completed => "completed",
            JobPhase::Error => "errored",
            JobPhase::TimedOut => "timed out",
        }
    }
}

/// A submitted job, owned by the `speak` call that created it.
#[derive(Debug, Clone)]
pub struct SpeechJob {
    pub request_id: String,
    pub phase: JobPhase,
    /// Status requests made so far.
    pub attempts: u32,
    /// Base64 audio, set once the job has completed.
    pub audio: Option<String>,
}

impl SpeechJob {
    pub fn submitted(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            phase: JobPhase::Submitted,
            attempts: 0,
            audio: None,
        }
    }

    /// Apply one observed status.
    fn observe(&mut self, status: JobStatus) {
        self.phase = match status {
            JobStatus::Completed { audio } => {
                self.audio = Some(audio);
                JobPhase::Completed
            }
            JobStatus::Error => JobPhase::Error,
            JobStatus::Pending | JobStatus::Other(_) => JobPhase::Pending,
        };
    }
}

// ---------------------------------------------------------------------------
// PollAttempt
// ---------------------------------------------------------------------------

/// One status request and the status it saw.
#[derive(Debug, Clone)]
pub struct PollAttempt {
    pub index: u32,
    pub status: String,
    pub at: Instant,
}

impl fmt::Display for PollAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "poll #{}: {}", self.index + 1, self.status)
    }
}

// ---------------------------------------------------------------------------
// poll_job
// ---------------------------------------------------------------------------

/// Drive `job` until it is terminal.
///
/// Requests are strictly sequential.  After a non-terminal status the loop
/// sleeps `policy.interval`, except after the last permitted attempt.  A
/// transport error ends the loop immediately and is returned as-is; the
/// caller decides how to surface it.
pub async fn poll_job(
    api: &dyn SpeechApi,
    job: &mut SpeechJob,
    policy: PollPolicy,
    diagnostics: &dyn DiagnosticsSink,
) -> Result<(), ApiError> {
    while !job.phase.is_terminal() {
        if job.attempts >= policy.max_attempts {
            job.phase = JobPhase::TimedOut;
            break;
        }

        let index = job.attempts;
        job.attempts += 1;
        let status = api.fetch_result(&job.request_id).await?;

        let attempt = PollAttempt {
            index,
            status: status.label().to_string(),
            at: Instant::now(),
        };
        diagnostics.info(&format!(
            "speech job {}: {attempt} (budget {})",
            job.request_id, policy.max_attempts
        ));

        job.observe(status);

        if !job.phase.is_terminal() && job.attempts < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
