//! OCR backend abstraction.
//!
//! Supports two recognition engines:
//! - Tesseract: traditional OCR via command-line (CPU)
//! - Ocrs: pure Rust OCR engine (CPU, feature: ocr-ocrs)

use std::collections::BTreeMap;
use std::path::PathBuf;

use image::DynamicImage;
use thiserror::Error;

/// Errors from OCR backends and rasterization.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Rasterization failed: {0}")]
    RasterizationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    #[default]
    Tesseract,
    /// Pure Rust OCR engine (ocrs crate).
    Ocrs,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::Ocrs => "ocrs",
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for OCR backends.
///
/// A backend is a capability probe plus a factory: `open` binds a
/// recognizer to a language and is the "initialization" step that may fail
/// independently of any page.
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Create a recognizer for the given language code.
    fn open(&self, lang: &str) -> Result<Box<dyn PageRecognizer>, OcrError>;
}

/// A recognizer bound to one language, used for the pages of one document.
pub trait PageRecognizer {
    /// Recognize the text of a single page image.
    fn recognize_page(&self, page: &DynamicImage) -> Result<String, OcrError>;
}

/// Built-in remap from Tesseract-style language codes to the two-letter
/// codes used by the OCRS reader.
const DEFAULT_LANGUAGE_MAP: &[(&str, &str)] = &[("eng", "en")];

/// Language code remap table.
///
/// Unmapped codes pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMap {
    entries: BTreeMap<String, String>,
}

impl Default for LanguageMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_LANGUAGE_MAP
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl LanguageMap {
    /// Built-in table extended (or overridden) by extra entries.
    pub fn with_overrides(extra: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        map.entries
            .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        map
    }

    /// Map a language code, passing unmapped codes through.
    pub fn map<'a>(&'a self, lang: &'a str) -> &'a str {
        self.entries.get(lang).map(String::as_str).unwrap_or(lang)
    }
}

/// Configuration for OCR backends.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to model files (for backends that need them).
    pub model_path: Option<PathBuf>,
    /// Whether missing models may be downloaded.
    pub download_models: bool,
    /// Language remap for backends that use two-letter codes.
    pub language_map: LanguageMap,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            download_models: true,
            language_map: LanguageMap::default(),
        }
    }
}
