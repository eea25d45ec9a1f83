//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a hand-edited `settings.toml` only
//! needs the keys it wants to override.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// PollConfig
// ---------------------------------------------------------------------------

/// Attempt budget for the speech-job poll loop.
///
/// The loop issues at most `max_attempts` status requests, waiting
/// `interval_ms` between consecutive attempts.  There is no backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of status requests per job.
    pub max_attempts: u32,
    /// Fixed wait between two attempts, in milliseconds.
    pub interval_ms: u64,
}

impl PollConfig {
    /// The interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval_ms: 1_000,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the remote text-to-speech service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    /// Voice model identifier sent with every synthesis job.
    pub model: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Drop the cached session and retry once when a submission is rejected
    /// with 401/403/404.  Off by default: the service has not been observed
    /// to expire sessions.
    pub reacquire_session_on_rejection: bool,
    /// Poll-loop budget.
    pub poll: PollConfig,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sproochmaschinn.lu".into(),
            model: "claude".into(),
            timeout_secs: 15,
            reacquire_session_on_rejection: false,
            poll: PollConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// OcrConfig
// ---------------------------------------------------------------------------

/// Settings for the OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language string, `+`-separated (e.g. `"deu+fra"`).
    pub languages: String,
    /// Name or path of the `tesseract` executable.
    pub tesseract_cmd: String,
    /// Start engine initialisation at launch instead of on the first scan.
    pub prewarm: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: "deu+fra".into(),
            tesseract_cmd: "tesseract".into(),
            prewarm: true,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial inner window size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
    /// Number of diagnostic entries kept for the log panel.
    pub log_capacity: usize,
    /// Show the log panel on startup.
    pub show_log: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (480.0, 560.0),
            always_on_top: false,
            log_capacity: 200,
            show_log: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use page_reader::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote speech service settings.
    pub speech: SpeechConfig,
    /// OCR engine settings.
    pub ocr: OcrConfig,
    /// UI settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` survives a save/load cycle.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = AppPaths::rooted_at(&dir.path().join("nested")).settings_file;

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.speech.base_url, loaded.speech.base_url);
        assert_eq!(original.speech.model, loaded.speech.model);
        assert_eq!(original.speech.timeout_secs, loaded.speech.timeout_secs);
        assert_eq!(original.speech.poll, loaded.speech.poll);
        assert_eq!(original.ocr.languages, loaded.ocr.languages);
        assert_eq!(original.ocr.tesseract_cmd, loaded.ocr.tesseract_cmd);
        assert_eq!(original.ui.window_size, loaded.ui.window_size);
        assert_eq!(original.ui.log_capacity, loaded.ui.log_capacity);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.speech.base_url, default.speech.base_url);
        assert_eq!(config.speech.poll, default.speech.poll);
        assert_eq!(config.ocr.languages, default.ocr.languages);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.speech.base_url, "https://sproochmaschinn.lu");
        assert_eq!(cfg.speech.model, "claude");
        assert!(!cfg.speech.reacquire_session_on_rejection);
        assert_eq!(cfg.speech.poll.max_attempts, 30);
        assert_eq!(cfg.speech.poll.interval(), Duration::from_secs(1));
        assert_eq!(cfg.ocr.languages, "deu+fra");
        assert_eq!(cfg.ocr.tesseract_cmd, "tesseract");
        assert_eq!(cfg.ui.log_capacity, 200);
    }

    /// A partial file only overrides the keys it names.
    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[speech]\nmodel = \"other\"\n\n[speech.poll]\nmax_attempts = 5\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");

        assert_eq!(cfg.speech.model, "other");
        assert_eq!(cfg.speech.poll.max_attempts, 5);
        assert_eq!(cfg.speech.poll.interval_ms, 1_000);
        assert_eq!(cfg.speech.base_url, "https://sproochmaschinn.lu");
        assert_eq!(cfg.ocr.languages, "deu+fra");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.speech.base_url = "http://localhost:8080".into();
        cfg.speech.reacquire_session_on_rejection = true;
        cfg.speech.poll.interval_ms = 250;
        cfg.ocr.languages = "eng".into();
        cfg.ui.always_on_top = true;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.speech.base_url, "http://localhost:8080");
        assert!(loaded.speech.reacquire_session_on_rejection);
        assert_eq!(loaded.speech.poll.interval_ms, 250);
        assert_eq!(loaded.ocr.languages, "eng");
        assert!(loaded.ui.always_on_top);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[speech\nmodel = ").expect("write");

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
