//! PNG data-URL payloads.

use crate::error::CaptureError;
use base64::Engine;
use image::{DynamicImage, ImageFormat};

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A frame serialized as `data:image/png;base64,...`.
///
/// Produced fresh on every capture and moved into the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data_url: String,
}

impl EncodedImage {
    /// Encode `image` as PNG in memory and wrap it as a data URL.
    pub fn from_image(image: &DynamicImage) -> Result<Self, CaptureError> {
        let mut png_bytes = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)?;
        Ok(Self::from_png_bytes(&png_bytes))
    }

    pub fn from_png_bytes(png_bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(png_bytes);
        Self {
            data_url: format!("{}{}", DATA_URL_PREFIX, payload),
        }
    }

    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }

    /// Decode the PNG bytes back out of the payload.
    pub fn png_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        let payload = &self.data_url[DATA_URL_PREFIX.len()..];
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CaptureError::Payload(e.to_string()))
    }

    /// Decode all the way to pixels.
    pub fn to_image(&self) -> Result<DynamicImage, CaptureError> {
        let bytes = self.png_bytes()?;
        Ok(image::load_from_memory_with_format(&bytes, ImageFormat::Png)?)
    }
}
