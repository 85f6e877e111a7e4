//! Frame capture domain — public API.
//!
//! Copies the current frame of the live surface into a fixed-size raster
//! buffer and serializes it as a PNG data URL.

mod encode;

pub use encode::EncodedImage;

use crate::camera::VideoSurface;
use crate::error::CaptureError;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Fixed-dimension raster the frame is drawn into.
///
/// The buffer size never follows the source: every draw scales the frame to
/// exactly `width` x `height`, stretching if the aspect ratios differ.
pub struct FrameBuffer {
    raster: RgbaImage,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Draw `frame` over the whole buffer (`drawImage(video, 0, 0, w, h)`).
    pub fn draw(&mut self, frame: &RgbImage) {
        let (w, h) = (self.width(), self.height());
        let rgba = DynamicImage::ImageRgb8(frame.clone()).to_rgba8();
        self.raster = if rgba.dimensions() == (w, h) {
            rgba
        } else {
            image::imageops::resize(&rgba, w, h, FilterType::Triangle)
        };
    }

    /// Encode the current buffer contents (`toDataURL('image/png')`).
    pub fn encode_png(&self) -> Result<EncodedImage, CaptureError> {
        EncodedImage::from_image(&DynamicImage::ImageRgba8(self.raster.clone()))
    }
}

/// Draw the surface's current frame into `buffer` and encode it.
pub fn capture_frame(
    surface: &VideoSurface,
    buffer: &mut FrameBuffer,
) -> Result<EncodedImage, CaptureError> {
    let start = std::time::Instant::now();
    let frame = surface.current_frame()?;
    let (src_w, src_h) = frame.dimensions();
    buffer.draw(&frame);
    let draw_ms = start.elapsed().as_millis();

    let encode_start = std::time::Instant::now();
    let encoded = buffer.encode_png()?;
    log::info!(
        "[CAPTURE] {}x{} -> {}x{} draw {}ms, PNG encode {}ms ({} chars)",
        src_w,
        src_h,
        buffer.width(),
        buffer.height(),
        draw_ms,
        encode_start.elapsed().as_millis(),
        encoded.as_data_url().len()
    );
    Ok(encoded)
}
