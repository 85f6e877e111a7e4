//! Tesseract OCR via rusty-tesseract.
//!
//! rusty-tesseract shells out to the system `tesseract` binary, so the binary
//! is located up front with `which` and every call runs on a blocking thread.

use super::{LanguageCode, ProgressSink, RecognitionProgress, RecognizedText, TextRecognizer};
use crate::capture::EncodedImage;
use crate::config::TesseractSettings;
use crate::error::RecognitionError;
use async_trait::async_trait;
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct TesseractRecognizer {
    settings: TesseractSettings,
}

/// Path of the `tesseract` binary on `PATH`.
pub fn locate_binary() -> Result<PathBuf, RecognitionError> {
    which::which("tesseract").map_err(|e| {
        RecognitionError::EngineUnavailable(format!("tesseract not found on PATH: {}", e))
    })
}

impl TesseractRecognizer {
    pub fn new(settings: TesseractSettings) -> Self {
        Self { settings }
    }

    /// Check the engine is installed. Call once at startup so a missing
    /// binary shows up in the log before the first capture.
    pub fn warm_up(&self) -> Result<String, RecognitionError> {
        let path = locate_binary()?;
        let version = rusty_tesseract::get_tesseract_version()
            .map_err(|e| RecognitionError::EngineUnavailable(e.to_string()))?;
        let first_line = version.lines().next().unwrap_or_default().to_string();
        log::info!("[OCR] Using {} ({})", first_line, path.display());
        Ok(first_line)
    }

    fn args(&self, language: &LanguageCode) -> Args {
        Args {
            lang: language.as_str().to_string(),
            config_variables: HashMap::new(),
            dpi: self.settings.dpi,
            psm: self.settings.psm,
            oem: self.settings.oem,
        }
    }
}

fn notify(progress: &Option<ProgressSink>, status: &str, value: f32) {
    if let Some(sink) = progress {
        sink(RecognitionProgress::new(status, value));
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(
        &self,
        image: EncodedImage,
        language: &LanguageCode,
        progress: Option<ProgressSink>,
    ) -> Result<RecognizedText, RecognitionError> {
        notify(&progress, "initializing tesseract", 0.0);
        locate_binary()?;
        notify(&progress, "initializing tesseract", 1.0);

        let args = self.args(language);
        let sink = progress.clone();
        let start = std::time::Instant::now();
        let text = tokio::task::spawn_blocking(move || {
            let decoded = image
                .to_image()
                .map_err(|e| RecognitionError::BadImage(e.to_string()))?;
            let tess_img = Image::from_dynamic_image(&decoded)
                .map_err(|e| RecognitionError::BadImage(e.to_string()))?;
            notify(&sink, "recognizing text", 0.0);
            let text = rusty_tesseract::image_to_string(&tess_img, &args)
                .map_err(|e| RecognitionError::Engine(e.to_string()))?;
            notify(&sink, "recognizing text", 1.0);
            Ok::<_, RecognitionError>(text)
        })
        .await
        .map_err(|e| RecognitionError::Aborted(e.to_string()))??;

        log::info!(
            "[OCR] Extracted {} chars in {}ms",
            text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(RecognizedText { text })
    }
}
