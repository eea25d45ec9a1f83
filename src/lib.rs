//! Page reader: photograph a printed page, extract its text with OCR, and
//! have a remote speech service read it aloud.

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod ocr;
pub mod pipeline;
pub mod speech;
