//! The output surface: where recognized text or an error message lands.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Shown when the camera can't be opened. Fatal for the session.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera access denied or not available.";
/// Shown when a recognition call fails. The next capture may still succeed.
pub const RECOGNITION_FAILED_MESSAGE: &str = "Error processing the image.";

/// A text display region. Each `show` replaces whatever was there.
pub trait OutputSink: Send + Sync {
    fn show(&self, text: &str);
}

/// Writes each update to stdout between separator lines.
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn show(&self, text: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "──────── output ────────");
        let _ = writeln!(out, "{}", text);
        let _ = writeln!(out, "────────────────────────");
        let _ = out.flush();
    }
}

/// In-memory surface; clones share the same text. Used when embedding the
/// scanner and in tests.
#[derive(Debug, Clone, Default)]
pub struct SharedOutput {
    text: Arc<Mutex<String>>,
    writes: Arc<Mutex<usize>>,
}

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// How many times the surface has been written.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|n| *n).unwrap_or_default()
    }
}

impl OutputSink for SharedOutput {
    fn show(&self, text: &str) {
        if let Ok(mut t) = self.text.lock() {
            *t = text.to_string();
        }
        if let Ok(mut n) = self.writes.lock() {
            *n += 1;
        }
    }
}
