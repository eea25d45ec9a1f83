//! OCR engine traits and shared types.
//!
//! An [`OcrBackend`] knows how to load an engine for a language set; loading
//! yields an [`OcrWorker`] that recognizes one image at a time.  Both report
//! [`Progress`] through a callback so the gateway can forward it to
//! diagnostics.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// All errors that can arise from the OCR subsystem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    /// The image could not be read or was empty.
    #[error("cannot read image: {0}")]
    Image(String),

    /// The engine could not be started or is missing a language.
    #[error("OCR engine initialisation failed: {0}")]
    EngineInit(String),

    /// The engine ran but reported a failure.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

// ---------------------------------------------------------------------------
// CapturedImage
// ---------------------------------------------------------------------------

/// Encoded image bytes (JPEG, PNG, …) of one captured page.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    source: Option<PathBuf>,
}

impl CapturedImage {
    /// Wrap in-memory bytes.  Empty input is rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RecognitionError> {
        if bytes.is_empty() {
            return Err(RecognitionError::Image("image is empty".into()));
        }
        Ok(Self {
            bytes,
            source: None,
        })
    }

    /// Read an image file.
    pub async fn load(path: &Path) -> Result<Self, RecognitionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RecognitionError::Image(format!("{}: {e}", path.display())))?;
        let mut image = Self::from_bytes(bytes)
            .map_err(|e| RecognitionError::Image(format!("{}: {e}", path.display())))?;
        image.source = Some(path.to_path_buf());
        Ok(image)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The file this image was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Which phase a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Engine start-up and language loading.
    Loading,
    /// Recognition of one image.
    Recognizing,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Loading => "loading engine",
            Stage::Recognizing => "recognizing text",
        }
    }
}

/// Engine-reported progress, `percent` in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub percent: u8,
}

impl Progress {
    pub fn new(stage: Stage, percent: u8) -> Self {
        Self {
            stage,
            percent: percent.min(100),
        }
    }
}

/// Progress callback handed to backends.
pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Send + Sync);

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A loaded engine instance.  Not re-entrant: one image at a time.
#[async_trait]
pub trait OcrWorker: Send {
    async fn recognize(
        &mut self,
        image: &CapturedImage,
        progress: ProgressFn<'_>,
    ) -> Result<String, RecognitionError>;
}

/// Factory for [`OcrWorker`]s.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Start an engine for `languages` (`+`-separated, e.g. `"deu+fra"`).
    async fn load(
        &self,
        languages: &str,
        progress: ProgressFn<'_>,
    ) -> Result<Box<dyn OcrWorker>, RecognitionError>;
}
