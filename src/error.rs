//! Error types for each stage of the scan flow.
//!
//! None of these are shown to the user directly. The output surface only
//! ever shows the fixed messages in `output.rs`; the detail goes to the log.

use thiserror::Error;

/// Camera acquisition and frame grabbing failures.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("permission to use the camera was denied: {0}")]
    PermissionDenied(String),
    #[error("no camera matches the requested constraints ({0})")]
    NoMatchingDevice(String),
    #[error("camera backend error: {0}")]
    Backend(String),
    #[error("camera stream is not running")]
    StreamClosed,
}

/// Drawing a frame into the raster buffer or encoding it.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no stream is bound to the video surface")]
    NoStream,
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("PNG encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("malformed image payload: {0}")]
    Payload(String),
}

/// Anything that goes wrong inside a text recognizer.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("could not decode image payload: {0}")]
    BadImage(String),
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("recognition task aborted: {0}")]
    Aborted(String),
}

/// Loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
