//! Scan pipeline: camera acquire at startup, then per trigger
//! draw frame → PNG data URL → recognize → show result.
//!
//! All collaborators are injected; nothing is looked up from global state.

use crate::camera::{self, MediaConstraints, MediaDevices, VideoSurface};
use crate::capture::{self, FrameBuffer};
use crate::config::Settings;
use crate::error::CameraError;
use crate::ocr::{LanguageCode, ProgressSink, TextRecognizer};
use crate::output::{OutputSink, RECOGNITION_FAILED_MESSAGE};
use crate::trigger::TriggerEvent;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What happens when a capture is triggered while recognition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Every call runs and writes the output; whichever finishes last wins,
    /// which is not necessarily the last one triggered.
    #[default]
    LastCompletion,
    /// Triggers are ignored until the in-flight call resolves.
    SingleFlight,
    /// Every call runs, but only the most recently triggered one may write.
    LatestTrigger,
}

impl FromStr for ConcurrencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "last_completion" => Ok(Self::LastCompletion),
            "single_flight" => Ok(Self::SingleFlight),
            "latest_trigger" => Ok(Self::LatestTrigger),
            other => Err(format!("unknown concurrency policy: {}", other)),
        }
    }
}

/// Decrements the in-flight count when a recognition task ends, even on panic.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Scanner {
    devices: Arc<dyn MediaDevices>,
    recognizer: Arc<dyn TextRecognizer>,
    output: Arc<dyn OutputSink>,
    surface: VideoSurface,
    buffer: Mutex<FrameBuffer>,
    constraints: MediaConstraints,
    language: LanguageCode,
    policy: ConcurrencyPolicy,
    progress: Option<ProgressSink>,
    in_flight: Arc<AtomicUsize>,
    generation: Arc<AtomicU64>,
}

impl Scanner {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        recognizer: Arc<dyn TextRecognizer>,
        output: Arc<dyn OutputSink>,
        settings: &Settings,
    ) -> Self {
        Self {
            devices,
            recognizer,
            output,
            surface: VideoSurface::new(),
            buffer: Mutex::new(FrameBuffer::new(settings.width, settings.height)),
            constraints: MediaConstraints::from_settings(settings),
            language: LanguageCode::new(settings.language.clone()),
            policy: settings.concurrency,
            progress: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach an observer for recognizer progress notifications.
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn surface(&self) -> &VideoSurface {
        &self.surface
    }

    /// Number of recognition calls that have not resolved yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Request the camera once and bind it. On failure the camera message is
    /// already on the output surface and every later capture is inert.
    pub async fn start(&self) -> Result<(), CameraError> {
        camera::acquire(
            self.devices.as_ref(),
            &self.constraints,
            &self.surface,
            self.output.as_ref(),
        )
        .await
    }

    /// Handle one capture trigger.
    ///
    /// Drawing and encoding happen before this returns; recognition runs on a
    /// spawned task whose handle is returned. `None` means nothing was sent
    /// to the recognizer. Must be called inside a tokio runtime.
    pub fn capture(&self) -> Option<JoinHandle<()>> {
        if !self.surface.is_bound() {
            log::warn!("[PIPELINE] Capture ignored: no camera stream bound");
            return None;
        }

        let slot = match self.policy {
            ConcurrencyPolicy::SingleFlight => {
                if self
                    .in_flight
                    .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    log::info!("[PIPELINE] Capture ignored: recognition already in flight");
                    return None;
                }
                InFlight(self.in_flight.clone())
            }
            _ => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                InFlight(self.in_flight.clone())
            }
        };

        let encoded = {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            match capture::capture_frame(&self.surface, &mut buffer) {
                Ok(encoded) => encoded,
                Err(e) => {
                    log::error!("[CAPTURE] Frame capture failed: {}", e);
                    return None;
                }
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = self.generation.clone();
        let recognizer = self.recognizer.clone();
        let output = self.output.clone();
        let language = self.language.clone();
        let progress = self.progress.clone();
        let policy = self.policy;
        log::info!("[PIPELINE] Capture #{} sent for recognition ({})", generation, language);

        Some(tokio::spawn(async move {
            let _slot = slot;
            let start = std::time::Instant::now();
            let result = recognizer.recognize(encoded, &language, progress).await;

            if policy == ConcurrencyPolicy::LatestTrigger
                && latest.load(Ordering::SeqCst) != generation
            {
                log::info!(
                    "[PIPELINE] Discarding result of capture #{} (superseded)",
                    generation
                );
                return;
            }

            match result {
                Ok(recognized) => {
                    log::info!(
                        "[PIPELINE] Capture #{} recognized in {}ms",
                        generation,
                        start.elapsed().as_millis()
                    );
                    output.show(&recognized.text);
                }
                Err(e) => {
                    log::error!("[OCR] Error recognizing text: {}", e);
                    output.show(RECOGNITION_FAILED_MESSAGE);
                }
            }
        }))
    }

    /// Start, then serve triggers until `Quit` or the channel closes. Waits
    /// for outstanding recognitions (there is no cancellation) and releases
    /// the camera before returning.
    pub async fn run(&self, mut triggers: mpsc::Receiver<TriggerEvent>) {
        if self.start().await.is_err() {
            log::warn!("[PIPELINE] No camera; captures will be ignored");
        } else if let Some(label) = self.surface.label() {
            log::info!("[PIPELINE] Ready, reading from '{}'", label);
        }

        let mut pending: Vec<JoinHandle<()>> = Vec::new();
        while let Some(event) = triggers.recv().await {
            match event {
                TriggerEvent::Capture => {
                    if let Some(handle) = self.capture() {
                        pending.push(handle);
                    }
                }
                TriggerEvent::Quit => break,
            }
            pending.retain(|h| !h.is_finished());
        }

        if !pending.is_empty() {
            log::info!("[PIPELINE] Waiting for {} recognition(s) to finish", pending.len());
        }
        for handle in pending {
            if let Err(e) = handle.await {
                log::error!("[PIPELINE] Recognition task failed: {}", e);
            }
        }
        self.surface.release();
    }
}
