//! Page reader window: egui/eframe application.
//!
//! # Architecture
//!
//! [`PageReaderApp`] is the top-level [`eframe::App`].  It never blocks on the
//! pipeline; instead it
//!
//! * sends [`PipelineCommand`]s over `command_tx`,
//! * reads [`SharedState`] for the extracted text and queued alerts,
//! * reads the two [`BusyFlag`]s to disable the buttons while they run,
//! * renders a snapshot of the [`DiagnosticsLog`] in the log panel.
//!
//! # Layout
//!
//! | Area | Content |
//! |------|---------|
//! | Top bar | title, log toggle, About |
//! | Centre | image path field + "Scan Page" |
//! | Sheet | editable extracted text + "Read Aloud" + close |
//! | Bottom | diagnostics log |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::diagnostics::{DiagnosticsLog, DiagnosticsSink, Level};
use crate::pipeline::{BusyFlag, PipelineCommand, SharedState};

/// Button label of the scan control.
pub fn scan_label(busy: bool) -> &'static str {
    if busy {
        "Scanning..."
    } else {
        "Scan Page"
    }
}

/// Button label of the read-aloud control.
pub fn speak_label(busy: bool) -> &'static str {
    if busy {
        "Processing..."
    } else {
        "Read Aloud"
    }
}

// ---------------------------------------------------------------------------
// PageReaderApp
// ---------------------------------------------------------------------------

/// eframe application: the page reader window.
pub struct PageReaderApp {
    // ── Shared with the pipeline ─────────────────────────────────────────
    state: SharedState,
    log: Arc<DiagnosticsLog>,
    scan_busy: BusyFlag,
    speak_busy: BusyFlag,
    command_tx: mpsc::Sender<PipelineCommand>,

    // ── UI-local state ───────────────────────────────────────────────────
    /// Contents of the image path field.
    image_path: String,
    /// Editable copy of the extracted text.
    sheet_text: String,
    /// `AppState::text_revision` that `sheet_text` was loaded from.
    sheet_revision: u64,
    /// Alert currently on screen, if any.
    current_alert: Option<String>,
    show_about: bool,
    show_log: bool,
    spinner_phase: f32,

    config: AppConfig,
}

impl PageReaderApp {
    /// Create a new [`PageReaderApp`].
    ///
    /// * `state`: shared application state.
    /// * `log`: diagnostics ring shown in the log panel.
    /// * `scan_busy`: busy flag of the scan control.
    /// * `speak_busy`: busy flag of the read-aloud control.
    /// * `command_tx`: sender end of the pipeline command channel.
    pub fn new(
        state: SharedState,
        log: Arc<DiagnosticsLog>,
        scan_busy: BusyFlag,
        speak_busy: BusyFlag,
        command_tx: mpsc::Sender<PipelineCommand>,
    ) -> Self {
        let config = state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .config
            .clone();
        Self {
            state,
            log,
            scan_busy,
            speak_busy,
            command_tx,
            image_path: String::new(),
            sheet_text: String::new(),
            sheet_revision: 0,
            current_alert: None,
            show_about: false,
            show_log: config.ui.show_log,
            spinner_phase: 0.0,
            config,
        }
    }

    // ── State polling ────────────────────────────────────────────────────

    /// Pull a new scan result into the editable sheet and take the next
    /// alert off the queue.
    fn sync_from_state(&mut self) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if st.text_revision != self.sheet_revision {
            self.sheet_revision = st.text_revision;
            self.sheet_text = st.extracted_text.clone().unwrap_or_default();
        }

        if self.current_alert.is_none() {
            self.current_alert = st.alerts.pop_front();
        }
    }

    fn sheet_open(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sheet_open
    }

    fn close_sheet(&self) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sheet_open = false;
    }

    /// Use the first dropped file as the image to scan.
    fn take_dropped_file(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .find_map(|f| f.path.clone())
        });
        if let Some(path) = dropped {
            self.image_path = path.display().to_string();
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn send(&self, command: PipelineCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            self.log.warn(&format!("ui: command not delivered: {e}"));
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Page Reader")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(15.0),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("About").clicked() {
                    self.show_about = true;
                }
                let log_label = if self.show_log { "Hide log" } else { "Show log" };
                if ui.button(log_label).clicked() {
                    self.show_log = !self.show_log;
                }
            });
        });
    }

    fn draw_scan_controls(&mut self, ui: &mut egui::Ui) {
        let busy = self.scan_busy.is_busy();

        ui.add_space(6.0);
        ui.label(
            egui::RichText::new("Page image (path, or drop a file on the window)")
                .color(egui::Color32::from_rgb(160, 160, 160))
                .size(12.0),
        );
        ui.add(
            egui::TextEdit::singleline(&mut self.image_path)
                .hint_text("/path/to/page.jpg")
                .desired_width(f32::INFINITY),
        );

        ui.add_space(6.0);
        let label = if busy {
            format!("{} {}", self.spinner_char(), scan_label(true))
        } else {
            scan_label(false).to_string()
        };
        let can_scan = !busy && !self.image_path.trim().is_empty();
        if ui
            .add_enabled(can_scan, egui::Button::new(egui::RichText::new(label).size(14.0)))
            .clicked()
        {
            let image = PathBuf::from(self.image_path.trim());
            self.send(PipelineCommand::Scan { image });
        }
    }

    /// Extracted text sheet: editable text, "Read Aloud", close.
    fn draw_sheet(&mut self, ui: &mut egui::Ui) {
        let busy = self.speak_busy.is_busy();

        ui.separator();
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Extracted text")
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(13.0),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new("x").size(12.0)).frame(false))
                    .clicked()
                {
                    self.close_sheet();
                }
            });
        });

        egui::ScrollArea::vertical()
            .id_salt("sheet")
            .max_height(220.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.sheet_text)
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
            });

        ui.add_space(4.0);
        let label = if busy {
            format!("{} {}", self.spinner_char(), speak_label(true))
        } else {
            speak_label(false).to_string()
        };
        if ui
            .add_enabled(!busy, egui::Button::new(egui::RichText::new(label).size(14.0)))
            .clicked()
        {
            self.send(PipelineCommand::Speak {
                text: self.sheet_text.clone(),
            });
        }
    }

    fn draw_log(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Log")
                    .color(egui::Color32::from_rgb(180, 180, 180))
                    .size(12.0),
            );
            if ui.small_button("Clear").clicked() {
                self.log.clear();
            }
        });

        egui::ScrollArea::vertical()
            .id_salt("log")
            .stick_to_bottom(true)
            .max_height(140.0)
            .show(ui, |ui| {
                for entry in self.log.snapshot() {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} {:5} {}",
                            entry.time_label(),
                            entry.level.label(),
                            entry.message
                        ))
                        .monospace()
                        .size(11.0)
                        .color(level_color(entry.level)),
                    );
                }
            });
    }

    fn draw_about(&mut self, ctx: &egui::Context) {
        let mut open = self.show_about;
        let mut close = false;
        egui::Window::new("About")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Page Reader");
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.add_space(4.0);
                ui.label("Scan a printed page and have it read aloud.");
                ui.label(format!("Speech: {}", self.config.speech.base_url));
                ui.label(format!("Voice model: {}", self.config.speech.model));
                ui.label(format!("OCR languages: {}", self.config.ocr.languages));
                ui.add_space(4.0);
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
        self.show_about = open && !close;
    }

    fn draw_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.current_alert.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(message)
                        .color(egui::Color32::from_rgb(255, 136, 68))
                        .size(13.0),
                );
                ui.add_space(4.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.current_alert = None;
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// A simple rotating ASCII spinner character driven by `spinner_phase`.
    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        let idx = (self.spinner_phase as usize) % chars.len();
        chars[idx]
    }
}

fn level_color(level: Level) -> egui::Color32 {
    match level {
        Level::Info => egui::Color32::from_rgb(150, 150, 150),
        Level::Warn => egui::Color32::from_rgb(255, 200, 80),
        Level::Error => egui::Color32::from_rgb(255, 100, 100),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for PageReaderApp {
    /// Called every frame by eframe.  Syncs shared state, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_from_state();
        self.take_dropped_file(ctx);

        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        // The pipeline updates state off-thread, so keep polling; faster
        // while a spinner is visible.
        if self.scan_busy.is_busy() || self.speak_busy.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(66));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.draw_top_bar(ui);
        });

        if self.show_log {
            egui::TopBottomPanel::bottom("log_panel")
                .resizable(true)
                .show(ctx, |ui| {
                    self.draw_log(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_scan_controls(ui);
            if self.sheet_open() {
                ui.add_space(8.0);
                self.draw_sheet(ui);
            }
        });

        self.draw_about(ctx);
        self.draw_alert(ctx);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
