//! OCR module: image → text.
//!
//! # Architecture
//!
//! ```text
//! RecognitionGateway::recognize(image)
//!        │
//!        ├─ OnceCell ── OcrBackend::load(languages)   once per process
//!        │
//!        └─ Mutex ───── OcrWorker::recognize(image)   one job at a time
//!                           │
//!                           └─ Progress → diagnostics
//! ```
//!
//! [`TesseractBackend`] is the production backend; tests plug in doubles
//! through the [`OcrBackend`] / [`OcrWorker`] traits.

pub mod engine;
pub mod gateway;
pub mod tesseract;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{
    CapturedImage, OcrBackend, OcrWorker, Progress, ProgressFn, RecognitionError, Stage,
};
pub use gateway::RecognitionGateway;
pub use tesseract::TesseractBackend;
