//! Pipeline orchestrator: turns UI commands into scan and read-aloud runs.
//!
//! [`PipelineOrchestrator`] owns the [`SharedState`] and responds to
//! [`PipelineCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Pipeline flow
//!
//! ```text
//! PipelineCommand::Scan { image }
//!   └─▶ [scan busy] load image → RecognitionGateway::recognize
//!         ├─ Ok  → state.extracted_text, open sheet
//!         └─ Err → diagnostics + one alert
//!
//! PipelineCommand::Speak { text }
//!   └─▶ [speak busy] SpeechOrchestrator::speak
//!         ├─ Ok  → audio already handed to playback
//!         └─ Err → diagnostics ("failed" / "timed out") + one alert
//! ```
//!
//! Each command runs on its own task, so a scan and a read-aloud may
//! interleave.  Each control is single-flight: a second command of the same
//! kind is refused while one is running, and the busy flag is released on
//! every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::diagnostics::Diagnostics;
use crate::ocr::{CapturedImage, RecognitionGateway};
use crate::speech::{SpeakOutcome, SpeechOrchestrator};

use super::busy::BusyFlag;
use super::notify::{UserNotifier, RECOGNITION_FAILED_ALERT, SPEECH_FAILED_ALERT};
use super::state::SharedState;

// ---------------------------------------------------------------------------
// Commands / outcomes
// ---------------------------------------------------------------------------

/// Commands sent from the UI thread to the pipeline orchestrator.
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    /// Run OCR on the image at `image`.
    Scan { image: PathBuf },
    /// Read `text` aloud.
    Speak { text: String },
}

/// How one command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Refused because the same control was already busy.
    Busy,
    /// Finished without a user-visible failure.
    Done,
    /// Failed; exactly one alert was raised.
    Failed,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives scans and read-aloud requests.
///
/// Create with [`PipelineOrchestrator::new`], wrap in an `Arc`, then call
/// [`run`](Self::run) inside a tokio task.
pub struct PipelineOrchestrator {
    state: SharedState,
    ocr: Arc<RecognitionGateway>,
    speech: Arc<SpeechOrchestrator>,
    notifier: Arc<dyn UserNotifier>,
    diagnostics: Diagnostics,
    scan_busy: BusyFlag,
    speak_busy: BusyFlag,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    ///
    /// * `state`: shared application state (also read by the UI).
    /// * `ocr`: recognition gateway.
    /// * `speech`: speech job orchestrator.
    /// * `notifier`: where user-visible alerts go.
    pub fn new(
        state: SharedState,
        ocr: Arc<RecognitionGateway>,
        speech: Arc<SpeechOrchestrator>,
        notifier: Arc<dyn UserNotifier>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            state,
            ocr,
            speech,
            notifier,
            diagnostics,
            scan_busy: BusyFlag::new(),
            speak_busy: BusyFlag::new(),
        }
    }

    /// Busy flag of the "Scan Page" control.
    pub fn scan_busy(&self) -> BusyFlag {
        self.scan_busy.clone()
    }

    /// Busy flag of the "Read Aloud" control.
    pub fn speak_busy(&self) -> BusyFlag {
        self.speak_busy.clone()
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `command_rx` is closed, then wait for in-flight commands.
    pub async fn run(self: Arc<Self>, mut command_rx: mpsc::Receiver<PipelineCommand>) {
        let mut tasks = JoinSet::new();

        while let Some(command) = command_rx.recv().await {
            while tasks.try_join_next().is_some() {}

            let this = Arc::clone(&self);
            match command {
                PipelineCommand::Scan { image } => {
                    tasks.spawn(async move {
                        this.scan(&image).await;
                    });
                }
                PipelineCommand::Speak { text } => {
                    tasks.spawn(async move {
                        this.read_aloud(&text).await;
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                log::warn!("pipeline: task ended abnormally: {e}");
            }
        }
        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    /// Scan the page image at `path`.
    pub async fn scan(&self, path: &Path) -> RunOutcome {
        let Some(_busy) = self.scan_busy.try_acquire() else {
            self.diagnostics.warn("scan: already scanning, request ignored");
            return RunOutcome::Busy;
        };

        self.diagnostics.info(&format!("scan: {}", path.display()));

        let result = match CapturedImage::load(path).await {
            Ok(image) => self.ocr.recognize(&image).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => {
                let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
                st.set_extracted_text(text);
                RunOutcome::Done
            }
            Err(e) => {
                self.diagnostics.error(&format!("scan: failed: {e}"));
                self.notifier.alert(RECOGNITION_FAILED_ALERT);
                RunOutcome::Failed
            }
        }
    }

    /// Read `text` aloud.
    pub async fn read_aloud(&self, text: &str) -> RunOutcome {
        let Some(_busy) = self.speak_busy.try_acquire() else {
            self.diagnostics
                .warn("speech: already processing, request ignored");
            return RunOutcome::Busy;
        };

        match self.speech.speak(text).await {
            Ok(SpeakOutcome::Skipped) => RunOutcome::Done,
            Ok(SpeakOutcome::Played { request_id, .. }) => {
                self.diagnostics
                    .info(&format!("speech: playing audio for {request_id}"));
                RunOutcome::Done
            }
            Err(e) => {
                if e.is_timeout() {
                    self.diagnostics.warn(&format!("speech: timed out: {e}"));
                } else {
                    self.diagnostics.error(&format!("speech: failed: {e}"));
                }
                self.notifier.alert(SPEECH_FAILED_ALERT);
                RunOutcome::Failed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::{AppConfig, SpeechConfig};
    use crate::diagnostics::RecordingSink;
    use crate::ocr::{OcrBackend, OcrWorker, ProgressFn, RecognitionError};
    use crate::pipeline::notify::RecordingNotifier;
    use crate::pipeline::state::new_shared_state;
    use crate::speech::{ApiError, JobStatus, MockSpeechApi, RecordingPlayback, SessionManager};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// OCR backend whose workers return a fixed result after a short delay.
    struct FixedOcr(Result<String, RecognitionError>);

    struct FixedWorker(Result<String, RecognitionError>);

    #[async_trait]
    impl OcrBackend for FixedOcr {
        async fn load(
            &self,
            _languages: &str,
            _progress: ProgressFn<'_>,
        ) -> Result<Box<dyn OcrWorker>, RecognitionError> {
            Ok(Box::new(FixedWorker(self.0.clone())))
        }
    }

    #[async_trait]
    impl OcrWorker for FixedWorker {
        async fn recognize(
            &mut self,
            _image: &CapturedImage,
            _progress: ProgressFn<'_>,
        ) -> Result<String, RecognitionError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.0.clone()
        }
    }

    struct Harness {
        orc: Arc<PipelineOrchestrator>,
        state: SharedState,
        api: Arc<MockSpeechApi>,
        playback: Arc<RecordingPlayback>,
        notifier: Arc<RecordingNotifier>,
        sink: Arc<RecordingSink>,
    }

    fn harness(api: MockSpeechApi, ocr: Result<&str, RecognitionError>) -> Harness {
        let state = new_shared_state(AppConfig::default());
        let sink = RecordingSink::new();
        let notifier = RecordingNotifier::new();
        let playback = RecordingPlayback::new();
        let api = Arc::new(api);

        let sessions = Arc::new(SessionManager::new(api.clone(), sink.clone()));
        let speech = Arc::new(SpeechOrchestrator::new(
            api.clone(),
            sessions,
            playback.clone(),
            sink.clone(),
            &SpeechConfig::default(),
        ));
        let gateway = Arc::new(RecognitionGateway::new(
            Arc::new(FixedOcr(ocr.map(str::to_string))),
            "deu+fra",
            sink.clone(),
        ));

        let orc = Arc::new(PipelineOrchestrator::new(
            Arc::clone(&state),
            gateway,
            speech,
            notifier.clone(),
            sink.clone(),
        ));

        Harness {
            orc,
            state,
            api,
            playback,
            notifier,
            sink,
        }
    }

    fn completes_with(audio: &str) -> MockSpeechApi {
        MockSpeechApi::new("s1", "r1").with_polls(vec![
            Ok(JobStatus::Pending),
            Ok(JobStatus::Completed {
                audio: audio.into(),
            }),
        ])
    }

    fn write_image(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("page.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    // -----------------------------------------------------------------------
    // Read aloud
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn success_plays_and_releases_busy() {
        let h = harness(completes_with("QUJD"), Ok(""));

        assert_eq!(h.orc.read_aloud("Moien").await, RunOutcome::Done);

        assert!(!h.orc.speak_busy().is_busy());
        assert_eq!(h.playback.played(), vec!["QUJD".to_string()]);
        assert!(h.notifier.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_error_alerts_once_and_releases_busy() {
        let h = harness(
            MockSpeechApi::new("s1", "r1")
                .with_polls(vec![Ok(JobStatus::Pending), Ok(JobStatus::Error)]),
            Ok(""),
        );

        assert_eq!(h.orc.read_aloud("Moien").await, RunOutcome::Failed);

        assert!(!h.orc.speak_busy().is_busy());
        assert_eq!(h.notifier.alerts(), vec![SPEECH_FAILED_ALERT.to_string()]);
        assert_eq!(h.sink.count_containing("speech: failed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_alerts_once_and_is_logged_as_timed_out() {
        let h = harness(MockSpeechApi::new("s1", "r1"), Ok(""));

        assert_eq!(h.orc.read_aloud("Moien").await, RunOutcome::Failed);

        assert!(!h.orc.speak_busy().is_busy());
        assert_eq!(h.api.poll_calls(), 30);
        assert_eq!(h.notifier.alerts(), vec![SPEECH_FAILED_ALERT.to_string()]);
        assert_eq!(h.sink.count_containing("speech: timed out"), 1);
        assert_eq!(h.sink.count_containing("speech: failed"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn session_failure_alerts_once_and_releases_busy() {
        let h = harness(
            MockSpeechApi::new("s1", "r1").failing_session(ApiError::Request("offline".into())),
            Ok(""),
        );

        assert_eq!(h.orc.read_aloud("Moien").await, RunOutcome::Failed);

        assert!(!h.orc.speak_busy().is_busy());
        assert_eq!(h.notifier.alerts().len(), 1);
        assert!(h.playback.played().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_is_silent() {
        let h = harness(completes_with("QUJD"), Ok(""));

        assert_eq!(h.orc.read_aloud("").await, RunOutcome::Done);

        assert_eq!(h.api.total_calls(), 0);
        assert!(h.notifier.alerts().is_empty());
        assert!(!h.orc.speak_busy().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn second_read_aloud_is_refused_while_busy() {
        let h = harness(completes_with("QUJD"), Ok(""));

        let (first, second) = tokio::join!(h.orc.read_aloud("one"), h.orc.read_aloud("two"));

        assert_eq!(first, RunOutcome::Done);
        assert_eq!(second, RunOutcome::Busy);
        assert_eq!(h.api.submit_calls(), 1);
        assert!(!h.orc.speak_busy().is_busy());
    }

    // -----------------------------------------------------------------------
    // Scan
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn scan_stores_text_and_opens_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir);
        let h = harness(completes_with("QUJD"), Ok("Moien Welt"));

        assert_eq!(h.orc.scan(&image).await, RunOutcome::Done);

        let st = h.state.lock().unwrap();
        assert_eq!(st.extracted_text.as_deref(), Some("Moien Welt"));
        assert!(st.sheet_open);
        assert!(!h.orc.scan_busy().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn scan_failure_alerts_once() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir);
        let h = harness(
            completes_with("QUJD"),
            Err(RecognitionError::Recognition("blurry".into())),
        );

        assert_eq!(h.orc.scan(&image).await, RunOutcome::Failed);

        assert_eq!(h.notifier.alerts(), vec![RECOGNITION_FAILED_ALERT.to_string()]);
        assert!(h.state.lock().unwrap().extracted_text.is_none());
        assert!(!h.orc.scan_busy().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_image_alerts_once() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(completes_with("QUJD"), Ok("text"));

        let outcome = h.orc.scan(&dir.path().join("missing.jpg")).await;

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(h.notifier.alerts().len(), 1);
        assert!(!h.orc.scan_busy().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn scan_and_read_aloud_run_independently() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir);
        let h = harness(completes_with("QUJD"), Ok("text"));

        let (scan, speak) = tokio::join!(h.orc.scan(&image), h.orc.read_aloud("Moien"));

        assert_eq!(scan, RunOutcome::Done);
        assert_eq!(speak, RunOutcome::Done);
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn run_processes_commands_and_drains_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir);
        let h = harness(completes_with("QUJD"), Ok("scanned"));

        let (tx, rx) = mpsc::channel(4);
        tx.send(PipelineCommand::Scan { image }).await.unwrap();
        tx.send(PipelineCommand::Speak {
            text: "Moien".into(),
        })
        .await
        .unwrap();
        drop(tx);

        Arc::clone(&h.orc).run(rx).await;

        assert_eq!(
            h.state.lock().unwrap().extracted_text.as_deref(),
            Some("scanned")
        );
        assert_eq!(h.playback.played(), vec!["QUJD".to_string()]);
        assert!(!h.orc.scan_busy().is_busy());
        assert!(!h.orc.speak_busy().is_busy());
    }
}
