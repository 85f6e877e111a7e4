//! OCR domain — the text recognizer contract.
//!
//! The pipeline treats recognition as an opaque async call:
//! encoded image + language hint (+ optional progress sink) → text or error.
//! `TesseractRecognizer` is the production engine; tests plug in their own.

pub mod tesseract;

pub use tesseract::TesseractRecognizer;

use crate::capture::EncodedImage;
use crate::error::RecognitionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Language hint in tesseract's three-letter form ("eng", "vie", "eng+vie").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn english() -> Self {
        Self::new("eng")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Intermediate status from a recognizer. Content is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionProgress {
    pub status: String,
    /// 0.0 ..= 1.0 within the current status.
    pub progress: f32,
}

impl RecognitionProgress {
    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self {
            status: status.into(),
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

/// Observer for progress notifications. No ordering guarantee across calls.
pub type ProgressSink = Arc<dyn Fn(RecognitionProgress) + Send + Sync>;

/// Sink that writes every notification to the debug log.
pub fn log_progress() -> ProgressSink {
    Arc::new(|p: RecognitionProgress| {
        log::debug!("[OCR] {} ({:.0}%)", p.status, p.progress * 100.0);
    })
}

/// Successful recognition. `text` is exactly what the engine returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedText {
    pub text: String,
}

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(
        &self,
        image: EncodedImage,
        language: &LanguageCode,
        progress: Option<ProgressSink>,
    ) -> Result<RecognizedText, RecognitionError>;
}
