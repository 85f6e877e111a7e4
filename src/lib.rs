//! Lens OCR — point the rear camera at text and read it back.
//!
//! This is the app shell that wires the domains together. No business logic
//! lives here, only module declarations, startup and dependency wiring.
//!
//!   - camera/    — stream acquisition and the live video surface
//!   - capture/   — fixed-size frame buffer and PNG data-URL encoding
//!   - ocr/       — recognizer contract and the tesseract engine
//!   - pipeline.rs — the scanner: acquire once, capture → recognize → show per trigger

pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod trigger;

pub use config::Settings;
pub use pipeline::{ConcurrencyPolicy, Scanner};

use std::sync::Arc;

/// Load `.env.local` → `.env` from the working directory, first one wins.
fn load_env_files() {
    'env_load: for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }
}

/// Entry point — called by the binary.
pub async fn run() -> Result<(), error::ConfigError> {
    load_env_files();
    env_logger::init();

    let settings = Settings::load()?;
    log::info!(
        "Lens OCR starting up ({}x{} buffer, lang={}, {:?})",
        settings.width,
        settings.height,
        settings.language,
        settings.concurrency
    );

    #[cfg(not(feature = "camera"))]
    {
        log::info!("[CAMERA] Built without the `camera` feature; no camera can be opened");
        eprintln!("[STARTUP] Camera support not compiled in (rebuild with --features camera)");
    }

    // Surface a missing OCR engine before the first capture.
    let recognizer = ocr::TesseractRecognizer::new(settings.tesseract.clone());
    let warm_start = std::time::Instant::now();
    match recognizer.warm_up() {
        Ok(_) => log::info!(
            "[OCR] Warm-up complete in {}ms",
            warm_start.elapsed().as_millis()
        ),
        Err(e) => log::warn!("[OCR] {}", e),
    }

    let scanner = Scanner::new(
        Arc::new(camera::NativeDevices),
        Arc::new(recognizer),
        Arc::new(output::ConsoleOutput),
        &settings,
    )
    .with_progress(ocr::log_progress());

    eprintln!("Press Enter to capture, q to quit.");
    scanner.run(trigger::stdin_trigger()).await;
    log::info!("Lens OCR shut down");
    Ok(())
}
