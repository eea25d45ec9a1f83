//! User-visible failure notifications.
//!
//! One generic alert per failed operation; the cause goes to diagnostics only.

use crate::pipeline::state::SharedState;

/// Alert shown when a read-aloud request produced no audio.
pub const SPEECH_FAILED_ALERT: &str = "Failed to generate speech.";

/// Alert shown when a scan produced no text.
pub const RECOGNITION_FAILED_ALERT: &str = "Failed to recognize text. Please try again.";

/// Surfaces a message to the user.
pub trait UserNotifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Queues alerts in [`SharedState`] for the UI to display.
#[derive(Clone)]
pub struct StateNotifier {
    state: SharedState,
}

impl StateNotifier {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl UserNotifier for StateNotifier {
    fn alert(&self, message: &str) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.alerts.push_back(message.to_string());
    }
}

/// Test double that records alerts.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl UserNotifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}
