//! Settings for the scanner.
//!
//! Sources, lowest priority first:
//!   1. built-in defaults
//!   2. JSON file at `$LENS_OCR_CONFIG` or `<config_dir>/lens-ocr/settings.json`
//!   3. environment variables (`LENS_OCR_*`), which `.env.local` / `.env` may populate

use crate::camera::FacingMode;
use crate::error::ConfigError;
use crate::pipeline::ConcurrencyPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var naming an explicit settings file.
pub const CONFIG_PATH_ENV: &str = "LENS_OCR_CONFIG";

/// Largest accepted raster side, in pixels.
pub const MAX_BUFFER_SIDE: u32 = 8192;

/// Options passed through to the tesseract binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractSettings {
    /// Page segmentation mode (`--psm`).
    pub psm: Option<i32>,
    /// OCR engine mode (`--oem`).
    pub oem: Option<i32>,
    pub dpi: Option<i32>,
}

impl Default for TesseractSettings {
    fn default() -> Self {
        Self {
            psm: Some(3),
            oem: Some(3),
            dpi: Some(150),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raster buffer width. Frames are scaled to this regardless of source size.
    pub width: u32,
    /// Raster buffer height.
    pub height: u32,
    /// Language hint handed to the recognizer (tesseract code, e.g. "eng").
    pub language: String,
    pub facing: FacingMode,
    /// Fail instead of falling back when no camera matches `facing`.
    pub exact_facing: bool,
    /// Pin a specific camera index, skipping facing detection.
    pub device_index: Option<u32>,
    pub concurrency: ConcurrencyPolicy,
    pub tesseract: TesseractSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            language: "eng".to_string(),
            facing: FacingMode::Environment,
            exact_facing: true,
            device_index: None,
            concurrency: ConcurrencyPolicy::LastCompletion,
            tesseract: TesseractSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config file (if any) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// `load` with an explicit variable lookup.
    ///
    /// A file named by `$LENS_OCR_CONFIG` must exist; the default location
    /// is optional.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            Some(explicit) => Self::from_file(Path::new(&explicit))?,
            None => match default_settings_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.apply_env(&lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a JSON settings file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("[CONFIG] Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Overlay `LENS_OCR_*` values. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LENS_OCR_WIDTH") {
            self.width = parse_u32("LENS_OCR_WIDTH", &v)?;
        }
        if let Some(v) = lookup("LENS_OCR_HEIGHT") {
            self.height = parse_u32("LENS_OCR_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("LENS_OCR_LANGUAGE") {
            self.language = v.trim().to_string();
        }
        if let Some(v) = lookup("LENS_OCR_FACING") {
            self.facing = v.parse().map_err(|_| ConfigError::Invalid {
                key: "LENS_OCR_FACING",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("LENS_OCR_DEVICE_INDEX") {
            self.device_index = Some(parse_u32("LENS_OCR_DEVICE_INDEX", &v)?);
        }
        if let Some(v) = lookup("LENS_OCR_CONCURRENCY") {
            self.concurrency = v.parse().map_err(|_| ConfigError::Invalid {
                key: "LENS_OCR_CONCURRENCY",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.width > MAX_BUFFER_SIDE {
            return Err(ConfigError::Invalid {
                key: "width",
                value: self.width.to_string(),
            });
        }
        if self.height == 0 || self.height > MAX_BUFFER_SIDE {
            return Err(ConfigError::Invalid {
                key: "height",
                value: self.height.to_string(),
            });
        }
        if self.language.is_empty() {
            return Err(ConfigError::Invalid {
                key: "language",
                value: String::new(),
            });
        }
        Ok(())
    }
}

/// Default settings file location, if a config directory can be determined.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lens-ocr").join("settings.json"))
}

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
