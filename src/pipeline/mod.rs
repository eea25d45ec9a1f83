//! Pipeline orchestrator module for the page reader.
//!
//! This module wires the two user actions (scan a page, read text aloud) to
//! the OCR and speech subsystems and exposes the shared state that the UI
//! reads every frame.
//!
//! # Architecture
//!
//! ```text
//! PipelineCommand (mpsc)
//!        │
//!        ▼
//! PipelineOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ Scan  { image } → RecognitionGateway  → state.extracted_text
//!        │
//!        └─ Speak { text }  → SpeechOrchestrator  → PlaybackSink
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! BusyFlag × 2                       ←─── disables the buttons while running
//! ```
//!
//! Failures reach the user through a [`UserNotifier`]: one alert per failed
//! action, with the detail going to diagnostics only.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use page_reader::config::AppConfig;
//! use page_reader::diagnostics::{Diagnostics, LogSink};
//! use page_reader::ocr::{RecognitionGateway, TesseractBackend};
//! use page_reader::pipeline::{new_shared_state, PipelineOrchestrator, StateNotifier};
//! use page_reader::speech::{HttpSpeechApi, RodioPlayback, SessionManager, SpeechOrchestrator};
//!
//! # fn main() -> anyhow::Result<()> {
//! # tokio::runtime::Runtime::new()?.block_on(async {
//! let config = AppConfig::default();
//! let diagnostics: Diagnostics = Arc::new(LogSink);
//! let state = new_shared_state(config.clone());
//!
//! let api = Arc::new(HttpSpeechApi::from_config(&config.speech));
//! let sessions = Arc::new(SessionManager::new(api.clone(), diagnostics.clone()));
//! let speech = Arc::new(SpeechOrchestrator::new(
//!     api,
//!     sessions,
//!     Arc::new(RodioPlayback::new(diagnostics.clone())),
//!     diagnostics.clone(),
//!     &config.speech,
//! ));
//! let ocr = Arc::new(RecognitionGateway::new(
//!     Arc::new(TesseractBackend::from_config(&config.ocr)),
//!     config.ocr.languages.clone(),
//!     diagnostics.clone(),
//! ));
//!
//! let (command_tx, command_rx) = mpsc::channel(16);
//! let orchestrator = Arc::new(PipelineOrchestrator::new(
//!     state.clone(),
//!     ocr,
//!     speech,
//!     Arc::new(StateNotifier::new(state)),
//!     diagnostics,
//! ));
//! tokio::spawn(orchestrator.run(command_rx));
//!
//! // command_tx is handed to the UI
//! # drop(command_tx);
//! # Ok::<(), anyhow::Error>(())
//! # })
//! # }
//! ```

pub mod busy;
pub mod notify;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use busy::{BusyFlag, BusyGuard};
pub use notify::{StateNotifier, UserNotifier, RECOGNITION_FAILED_ALERT, SPEECH_FAILED_ALERT};
pub use runner::{PipelineCommand, PipelineOrchestrator, RunOutcome};
pub use state::{new_shared_state, AppState, SharedState};

#[cfg(test)]
pub use notify::RecordingNotifier;
