//! Shared application state.
//!
//! [`AppState`] is what the background pipeline hands to the UI: the latest
//! extracted text, whether the text sheet is open, and pending alerts.  The
//! busy state of each control lives in its [`BusyFlag`](super::BusyFlag),
//! not here.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>`: cheap to clone
//! and safe to share across threads.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;

/// Shared application state: the single source of truth for the UI.
pub struct AppState {
    /// Text from the most recent successful scan.
    pub extracted_text: Option<String>,

    /// Bumped whenever `extracted_text` is replaced, so the UI knows to
    /// reload its editable copy.
    pub text_revision: u64,

    /// Whether the extracted-text sheet is shown.
    pub sheet_open: bool,

    /// Alerts waiting to be shown, oldest first.
    pub alerts: VecDeque<String>,

    /// Current application configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            extracted_text: None,
            text_revision: 0,
            sheet_open: false,
            alerts: VecDeque::new(),
            config,
        }
    }

    /// Replace the extracted text and open the sheet.
    pub fn set_extracted_text(&mut self, text: String) {
        self.extracted_text = Some(text);
        self.text_revision += 1;
        self.sheet_open = true;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Thread-safe handle to [`AppState`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] wrapping a fresh [`AppState`].
pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_empty() {
        let state = AppState::default();
        assert!(state.extracted_text.is_none());
        assert_eq!(state.text_revision, 0);
        assert!(!state.sheet_open);
        assert!(state.alerts.is_empty());
    }

    #[test]
    fn set_extracted_text_bumps_revision_and_opens_sheet() {
        let mut state = AppState::default();
        state.set_extracted_text("one".into());
        state.set_extracted_text("two".into());

        assert_eq!(state.extracted_text.as_deref(), Some("two"));
        assert_eq!(state.text_revision, 2);
        assert!(state.sheet_open);
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_state(AppConfig::default());
        let state2 = Arc::clone(&state);

        state.lock().unwrap().sheet_open = true;
        assert!(state2.lock().unwrap().sheet_open);
    }
}
