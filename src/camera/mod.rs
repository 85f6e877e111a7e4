//! Camera domain — public API.
//!
//! Requests a video stream matching a facing constraint, binds it to the
//! live `VideoSurface`, and hands out frames on demand. External code should
//! only use what is exported here.

pub mod facing;
pub mod native;

pub use facing::{detect_facing, select_device};
pub use native::NativeDevices;

use crate::error::{CameraError, CaptureError};
use crate::output::{OutputSink, CAMERA_UNAVAILABLE_MESSAGE};
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Mutex;

/// Which way the requested camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Away from the user (rear camera).
    Environment,
    /// Toward the user (front camera / webcam).
    User,
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            other => Err(format!("unknown facing mode: {}", other)),
        }
    }
}

/// Constraints for a stream request.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConstraints {
    pub facing: FacingMode,
    /// Fail when nothing matches `facing` instead of using any camera.
    pub exact: bool,
    pub device_index: Option<u32>,
}

impl MediaConstraints {
    /// `facingMode: { exact: "environment" }`
    pub fn rear_exact() -> Self {
        Self {
            facing: FacingMode::Environment,
            exact: true,
            device_index: None,
        }
    }

    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self {
            facing: settings.facing,
            exact: settings.exact_facing,
            device_index: settings.device_index,
        }
    }
}

/// A camera as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
    pub description: String,
}

/// A live camera feed. Dropping it releases the device.
pub trait MediaStream: Send {
    /// Human-readable device name.
    fn label(&self) -> &str;
    /// Native frame size as negotiated with the device.
    fn resolution(&self) -> (u32, u32);
    /// The most recent frame.
    fn grab_frame(&mut self) -> Result<RgbImage, CameraError>;
    /// Stop the feed. Further `grab_frame` calls return `StreamClosed`.
    fn stop(&mut self);
}

/// Source of camera streams (the host's `getUserMedia`).
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// The live video surface a stream is bound to.
///
/// Holds at most one stream. Capture reads frames from here; with nothing
/// bound, capture is inert.
pub struct VideoSurface {
    stream: Mutex<Option<Box<dyn MediaStream>>>,
}

impl VideoSurface {
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
        }
    }

    /// Bind `stream` as the live source, releasing any previous one.
    pub fn bind(&self, stream: Box<dyn MediaStream>) {
        let mut guard = self.lock();
        if let Some(mut old) = guard.replace(stream) {
            old.stop();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lock().is_some()
    }

    /// Label of the bound stream, if any.
    pub fn label(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.label().to_string())
    }

    /// Current frame of the bound stream.
    pub fn current_frame(&self) -> Result<RgbImage, CaptureError> {
        let mut guard = self.lock();
        let stream = guard.as_mut().ok_or(CaptureError::NoStream)?;
        Ok(stream.grab_frame()?)
    }

    /// Stop and drop the bound stream.
    pub fn release(&self) {
        if let Some(mut stream) = self.lock().take() {
            log::info!("[CAMERA] Releasing stream '{}'", stream.label());
            stream.stop();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn MediaStream>>> {
        // A panic mid-grab leaves the Option itself intact.
        self.stream.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for VideoSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VideoSurface {
    fn drop(&mut self) {
        self.release();
    }
}

/// Request a stream and bind it to `surface`.
///
/// On failure the fixed camera message is written to `output` and the error
/// is returned. There is no retry and no fallback camera.
pub async fn acquire(
    devices: &dyn MediaDevices,
    constraints: &MediaConstraints,
    surface: &VideoSurface,
    output: &dyn OutputSink,
) -> Result<(), CameraError> {
    let start = std::time::Instant::now();
    match devices.get_user_media(constraints).await {
        Ok(stream) => {
            let (w, h) = stream.resolution();
            log::info!(
                "[CAMERA] Bound '{}' ({}x{}) in {}ms",
                stream.label(),
                w,
                h,
                start.elapsed().as_millis()
            );
            surface.bind(stream);
            Ok(())
        }
        Err(e) => {
            log::error!("[CAMERA] Error accessing the camera: {}", e);
            output.show(CAMERA_UNAVAILABLE_MESSAGE);
            Err(e)
        }
    }
}
