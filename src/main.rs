//! Application entry point: Page Reader.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread).
//! 4. Build the speech stack and warm up a session in the background.
//! 5. Build the OCR gateway and, if configured, load the engine early.
//! 6. Spawn the pipeline orchestrator on the runtime.
//! 7. Run [`eframe::run_native`]: blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use eframe::egui;
use tokio::sync::mpsc;

use page_reader::{
    app::PageReaderApp,
    config::AppConfig,
    diagnostics::{Diagnostics, DiagnosticsLog},
    ocr::{RecognitionGateway, TesseractBackend},
    pipeline::{new_shared_state, PipelineCommand, PipelineOrchestrator, StateNotifier},
    speech::{HttpSpeechApi, RodioPlayback, SessionManager, SpeechOrchestrator},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Page Reader")
        .with_inner_size([width, height])
        .with_min_inner_size([320.0, 240.0])
        .with_drag_and_drop(true);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Page Reader starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let _rt_guard = rt.enter();

    let log = Arc::new(DiagnosticsLog::new(config.ui.log_capacity));
    let diagnostics: Diagnostics = log.clone();

    // 4. Speech: HTTP client, session cache, playback
    let api = Arc::new(HttpSpeechApi::from_config(&config.speech));
    let sessions = Arc::new(SessionManager::new(api.clone(), diagnostics.clone()));
    sessions.prewarm();

    let speech = Arc::new(SpeechOrchestrator::new(
        api,
        Arc::clone(&sessions),
        Arc::new(RodioPlayback::new(diagnostics.clone())),
        diagnostics.clone(),
        &config.speech,
    ));

    // 5. OCR
    let ocr = Arc::new(RecognitionGateway::new(
        Arc::new(TesseractBackend::from_config(&config.ocr)),
        config.ocr.languages.clone(),
        diagnostics.clone(),
    ));
    if config.ocr.prewarm {
        ocr.prewarm();
    }

    // 6. Pipeline orchestrator
    let state = new_shared_state(config.clone());
    let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(16);
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        Arc::clone(&state),
        ocr,
        speech,
        Arc::new(StateNotifier::new(Arc::clone(&state))),
        diagnostics,
    ));
    let scan_busy = orchestrator.scan_busy();
    let speak_busy = orchestrator.speak_busy();
    rt.spawn(orchestrator.run(command_rx));

    // 7. UI (blocks until the window is closed)
    let app = PageReaderApp::new(state, log, scan_busy, speak_busy, command_tx);
    let options = native_options(&config);

    eframe::run_native(
        "Page Reader",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("UI terminated with an error: {e}"))?;

    log::info!("Page Reader shutting down");
    Ok(())
}
