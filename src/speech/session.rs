//! Session acquisition and caching.
//!
//! The speech service scopes every synthesis job to an opaque session id.
//! [`SessionManager`] obtains one lazily and keeps it for the lifetime of the
//! process.  The in-flight *request* is memoized, not just the result: every
//! caller that arrives while an acquisition is outstanding awaits that same
//! request and sees its outcome, success or failure.
//!
//! ```text
//! Empty ──get_session──▶ Pending(gen) ──Ok──▶ Ready(id)
//!                            │
//!                            └──Err──▶ Empty   (next call retries)
//! Ready ──invalidate──▶ Empty
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::speech::api::{ApiError, SpeechApi};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque session token issued by the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionAcquisitionFailed
// ---------------------------------------------------------------------------

/// Creating a session failed (network error, non-success status or malformed
/// payload).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("session acquisition failed: {cause}")]
pub struct SessionAcquisitionFailed {
    pub cause: ApiError,
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

type PendingRequest = Shared<BoxFuture<'static, Result<SessionId, SessionAcquisitionFailed>>>;

enum Slot {
    Empty,
    Pending {
        generation: u64,
        request: PendingRequest,
    },
    Ready(SessionId),
}

struct SlotState {
    slot: Slot,
    /// Bumped for every new request so a stale waiter never clobbers a newer
    /// acquisition.
    generation: u64,
}

/// Process-wide owner of the speech-service session.
///
/// Construct once in `main` and share it as `Arc<SessionManager>`.  The slot
/// mutex is only held for bookkeeping, never across an `.await`.
pub struct SessionManager {
    api: Arc<dyn SpeechApi>,
    diagnostics: Diagnostics,
    state: Mutex<SlotState>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn SpeechApi>, diagnostics: Diagnostics) -> Self {
        Self {
            api,
            diagnostics,
            state: Mutex::new(SlotState {
                slot: Slot::Empty,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached session, acquiring one if necessary.
    ///
    /// * Ready   → returned immediately, no network activity.
    /// * Pending → awaits the outstanding request.
    /// * Empty   → starts exactly one `create_session` request.
    pub async fn get_session(&self) -> Result<SessionId, SessionAcquisitionFailed> {
        let (generation, request) = {
            let mut state = self.lock();
            match &state.slot {
                Slot::Ready(id) => return Ok(id.clone()),
                Slot::Pending {
                    generation,
                    request,
                } => {
                    log::debug!("session: joining in-flight acquisition");
                    (*generation, request.clone())
                }
                Slot::Empty => {
                    state.generation += 1;
                    let generation = state.generation;
                    let request = acquire(Arc::clone(&self.api), Arc::clone(&self.diagnostics))
                        .boxed()
                        .shared();
                    state.slot = Slot::Pending {
                        generation,
                        request: request.clone(),
                    };
                    (generation, request)
                }
            }
        };

        let result = request.await;

        let mut state = self.lock();
        let still_current = matches!(
            &state.slot,
            Slot::Pending { generation: g, .. } if *g == generation
        );
        if still_current {
            state.slot = match &result {
                Ok(id) => Slot::Ready(id.clone()),
                Err(_) => Slot::Empty,
            };
        }
        result
    }

    /// Start acquiring a session in the background (startup warm-up).
    ///
    /// Failure is logged by the acquisition itself and otherwise ignored; the
    /// slot stays empty and the first `speak` retries.
    pub fn prewarm(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _ = this.get_session().await;
        })
    }

    /// The cached session, if one has been acquired.
    pub fn current(&self) -> Option<SessionId> {
        match &self.lock().slot {
            Slot::Ready(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Drop a cached session so the next call acquires a fresh one.
    ///
    /// An in-flight acquisition is left alone.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        if let Slot::Ready(id) = &state.slot {
            self.diagnostics
                .warn(&format!("session: discarding session {id}"));
            state.slot = Slot::Empty;
        }
    }
}

/// One `create_session` round trip with diagnostics.
async fn acquire(
    api: Arc<dyn SpeechApi>,
    diagnostics: Diagnostics,
) -> Result<SessionId, SessionAcquisitionFailed> {
    diagnostics.info("session: requesting new session");
    match api.create_session().await {
        Ok(id) => {
            diagnostics.info(&format!("session: acquired {id}"));
            Ok(SessionId(id))
        }
        Err(cause) => {
            diagnostics.error(&format!("session: acquisition failed: {cause}"));
            Err(SessionAcquisitionFailed { cause })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
