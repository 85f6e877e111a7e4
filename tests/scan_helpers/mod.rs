//! Shared fakes for scanner tests: camera devices and recognizers whose
//! behavior each test controls.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use lens_ocr_lib::camera::{MediaConstraints, MediaDevices, MediaStream};
use lens_ocr_lib::capture::EncodedImage;
use lens_ocr_lib::error::{CameraError, RecognitionError};
use lens_ocr_lib::ocr::{
    LanguageCode, ProgressSink, RecognitionProgress, RecognizedText, TextRecognizer,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// ── Camera fakes ─────────────────────────────────────────────────────

/// Stream producing a solid frame at a fixed native resolution.
pub struct FakeStream {
    pub width: u32,
    pub height: u32,
    pub fail_grab: bool,
    pub stopped: Arc<AtomicBool>,
}

impl MediaStream for FakeStream {
    fn label(&self) -> &str {
        "Fake Back Camera"
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CameraError::StreamClosed);
        }
        if self.fail_grab {
            return Err(CameraError::Backend("sensor glitch".to_string()));
        }
        Ok(RgbImage::from_pixel(self.width, self.height, Rgb([240, 240, 240])))
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

pub enum Permission {
    Granted { width: u32, height: u32 },
    GrantedBrokenSensor,
    Denied,
}

pub struct FakeDevices {
    permission: Permission,
    pub requests: AtomicUsize,
    pub last_constraints: Mutex<Option<MediaConstraints>>,
    pub stream_stopped: Arc<AtomicBool>,
}

impl FakeDevices {
    pub fn new(permission: Permission) -> Arc<Self> {
        Arc::new(Self {
            permission,
            requests: AtomicUsize::new(0),
            last_constraints: Mutex::new(None),
            stream_stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn granted() -> Arc<Self> {
        Self::new(Permission::Granted {
            width: 1280,
            height: 720,
        })
    }

    pub fn denied() -> Arc<Self> {
        Self::new(Permission::Denied)
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap() = Some(constraints.clone());
        match self.permission {
            Permission::Granted { width, height } => Ok(Box::new(FakeStream {
                width,
                height,
                fail_grab: false,
                stopped: self.stream_stopped.clone(),
            })),
            Permission::GrantedBrokenSensor => Ok(Box::new(FakeStream {
                width: 640,
                height: 480,
                fail_grab: true,
                stopped: self.stream_stopped.clone(),
            })),
            Permission::Denied => Err(CameraError::PermissionDenied(
                "NotAllowedError".to_string(),
            )),
        }
    }
}

// ── Recognizer fakes ─────────────────────────────────────────────────

/// Resolves every call immediately with a fixed outcome and records inputs.
pub struct FixedRecognizer {
    outcome: Result<String, String>,
    pub images: Mutex<Vec<EncodedImage>>,
    pub languages: Mutex<Vec<LanguageCode>>,
}

impl FixedRecognizer {
    pub fn text(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(text.to_string()),
            images: Mutex::new(Vec::new()),
            languages: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(reason.to_string()),
            images: Mutex::new(Vec::new()),
            languages: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

#[async_trait]
impl TextRecognizer for FixedRecognizer {
    async fn recognize(
        &self,
        image: EncodedImage,
        language: &LanguageCode,
        progress: Option<ProgressSink>,
    ) -> Result<RecognizedText, RecognitionError> {
        self.images.lock().unwrap().push(image);
        self.languages.lock().unwrap().push(language.clone());
        if let Some(sink) = &progress {
            sink(RecognitionProgress::new("recognizing text", 0.5));
            sink(RecognitionProgress::new("recognizing text", 1.0));
        }
        match &self.outcome {
            Ok(text) => Ok(RecognizedText { text: text.clone() }),
            Err(reason) => Err(RecognitionError::Engine(reason.clone())),
        }
    }
}

/// One recognition call parked until the test answers it.
pub struct PendingCall {
    pub image: EncodedImage,
    reply: oneshot::Sender<Result<RecognizedText, RecognitionError>>,
}

impl PendingCall {
    pub fn succeed(self, text: &str) {
        let _ = self.reply.send(Ok(RecognizedText {
            text: text.to_string(),
        }));
    }

    pub fn fail(self) {
        let _ = self
            .reply
            .send(Err(RecognitionError::Engine("unreadable".to_string())));
    }
}

/// Recognizer whose calls complete only when the test says so, in any order.
pub struct ScriptedRecognizer {
    calls: mpsc::UnboundedSender<PendingCall>,
}

impl ScriptedRecognizer {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls: tx }), rx)
    }
}

#[async_trait]
impl TextRecognizer for ScriptedRecognizer {
    async fn recognize(
        &self,
        image: EncodedImage,
        _language: &LanguageCode,
        _progress: Option<ProgressSink>,
    ) -> Result<RecognizedText, RecognitionError> {
        let (reply, answer) = oneshot::channel();
        self.calls
            .send(PendingCall { image, reply })
            .map_err(|_| RecognitionError::Aborted("test dropped receiver".to_string()))?;
        answer
            .await
            .map_err(|_| RecognitionError::Aborted("test dropped call".to_string()))?
    }
}
