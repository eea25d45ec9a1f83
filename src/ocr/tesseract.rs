//! [`OcrBackend`] backed by the `tesseract` command-line tool.
//!
//! Loading checks that the binary runs and that every requested language is
//! installed (`tesseract --list-langs`).  Recognition stages the image in a
//! temporary file and runs `tesseract <file> stdout -l <languages>`.

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::OcrConfig;
use crate::ocr::engine::{
    CapturedImage, OcrBackend, OcrWorker, Progress, ProgressFn, RecognitionError, Stage,
};

// ---------------------------------------------------------------------------
// Language list helpers
// ---------------------------------------------------------------------------

/// Parse the output of `tesseract --list-langs`.
///
/// The first line is a header (`List of available languages in "…" (N):`);
/// every following non-empty line is one language code.
pub fn parse_language_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.starts_with("List of available languages"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Requested languages (`+`-separated) that are not in `available`.
pub fn missing_languages(requested: &str, available: &[String]) -> Vec<String> {
    requested
        .split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .filter(|lang| !available.iter().any(|a| a == lang))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// TesseractBackend
// ---------------------------------------------------------------------------

/// Spawns the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    command: String,
}

impl TesseractBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.tesseract_cmd.clone())
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    async fn load(
        &self,
        languages: &str,
        progress: ProgressFn<'_>,
    ) -> Result<Box<dyn OcrWorker>, RecognitionError> {
        progress(Progress::new(Stage::Loading, 0));

        let output = Command::new(&self.command)
            .arg("--list-langs")
            .output()
            .await
            .map_err(|e| RecognitionError::EngineInit(format!("cannot run {}: {e}", self.command)))?;

        if !output.status.success() {
            return Err(RecognitionError::EngineInit(format!(
                "{} --list-langs exited with {}",
                self.command, output.status
            )));
        }

        // Older releases print the list on stderr.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        let available = parse_language_list(&listing);

        let missing = missing_languages(languages, &available);
        if !missing.is_empty() {
            return Err(RecognitionError::EngineInit(format!(
                "language data not installed: {}",
                missing.join(", ")
            )));
        }

        progress(Progress::new(Stage::Loading, 100));

        Ok(Box::new(TesseractWorker {
            command: self.command.clone(),
            languages: languages.to_string(),
        }))
    }
}

// ---------------------------------------------------------------------------
// TesseractWorker
// ---------------------------------------------------------------------------

struct TesseractWorker {
    command: String,
    languages: String,
}

#[async_trait]
impl OcrWorker for TesseractWorker {
    async fn recognize(
        &mut self,
        image: &CapturedImage,
        progress: ProgressFn<'_>,
    ) -> Result<String, RecognitionError> {
        progress(Progress::new(Stage::Recognizing, 0));

        let staged = tempfile::Builder::new()
            .prefix("page-reader-")
            .tempfile()
            .map_err(|e| RecognitionError::Image(format!("cannot stage image: {e}")))?;
        tokio::fs::write(staged.path(), image.bytes())
            .await
            .map_err(|e| RecognitionError::Image(format!("cannot stage image: {e}")))?;

        progress(Progress::new(Stage::Recognizing, 10));

        let output = Command::new(&self.command)
            .arg(staged.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .await
            .map_err(|e| RecognitionError::Recognition(format!("cannot run {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Recognition(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        progress(Progress::new(Stage::Recognizing, 100));

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
