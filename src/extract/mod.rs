//! Text extraction strategies and the hybrid fallback orchestrator.
//!
//! Strategies, cheapest first:
//! - Apache Tika (text + metadata, via a Tika server)
//! - pdftotext (Poppler), page by page
//! - OCR (see [`crate::ocr`])

mod hybrid;
mod pdftotext;
mod preview;
mod tika;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ocr::{OcrBackendType, OcrOptions};

pub use hybrid::HybridExtractor;
pub use pdftotext::PdfTextExtractor;
pub use preview::preview_text;
pub use tika::TikaExtractor;

/// Document metadata as flat key/value pairs.
pub type Metadata = BTreeMap<String, String>;

/// Default quality threshold, in characters.
pub const DEFAULT_MIN_LENGTH: usize = 50_000;

/// Errors that can occur inside an extraction strategy.
///
/// These never leave a strategy's [`DocumentExtractor::extract`]; they are
/// logged and turned into empty output there.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Service not available: {0}")]
    Unavailable(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of one extraction strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub metadata: Metadata,
}

impl Extracted {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }
}

/// A strategy that turns a document into text (and possibly metadata).
pub trait DocumentExtractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Check if the strategy's dependency is present.
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this strategy available.
    fn availability_hint(&self) -> String;

    /// Extract text. Never fails: unavailability and errors yield empty
    /// (or, where the strategy allows it, partial) output.
    fn extract(&self, file_path: &Path) -> Extracted;
}

/// Which strategy produced the returned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Fast structured extractor (Tika).
    Structured,
    /// Page-text extractor (pdftotext).
    PageText,
    /// OCR sub-pipeline.
    Ocr,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Structured => "structured",
            Provenance::PageText => "page_text",
            Provenance::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final outcome of one extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Extracted text; empty when nothing could be extracted.
    pub text: String,
    /// Metadata from the structured extractor, if it produced any.
    pub metadata: Metadata,
    /// Strategy that produced `text`.
    pub provenance: Provenance,
}

/// Parameters of one extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub file_path: PathBuf,
    /// Quality threshold (characters) below which fallbacks run.
    pub min_length: usize,
    /// Run OCR regardless of the other strategies' output.
    pub force_ocr: bool,
    pub ocr_max_pages: u32,
    pub ocr_engine: OcrBackendType,
    pub ocr_lang: String,
}

impl ExtractionRequest {
    /// Create a request with default settings.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let ocr = OcrOptions::default();
        Self {
            file_path: file_path.into(),
            min_length: DEFAULT_MIN_LENGTH,
            force_ocr: false,
            ocr_max_pages: ocr.max_pages,
            ocr_engine: ocr.engine,
            ocr_lang: ocr.lang,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_force_ocr(mut self, force_ocr: bool) -> Self {
        self.force_ocr = force_ocr;
        self
    }

    /// Set the OCR page bound (at least one page).
    pub fn with_ocr_max_pages(mut self, max_pages: u32) -> Self {
        self.ocr_max_pages = max_pages.max(1);
        self
    }

    pub fn with_ocr_engine(mut self, engine: OcrBackendType) -> Self {
        self.ocr_engine = engine;
        self
    }

    pub fn with_ocr_lang(mut self, lang: &str) -> Self {
        self.ocr_lang = lang.to_string();
        self
    }

    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            max_pages: self.ocr_max_pages,
            engine: self.ocr_engine,
            lang: self.ocr_lang.clone(),
        }
    }
}

/// Length in characters, the unit of every threshold and comparison.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = ExtractionRequest::new("doc.pdf");
        assert_eq!(request.min_length, 50_000);
        assert!(!request.force_ocr);
        assert_eq!(request.ocr_max_pages, 10);
        assert_eq!(request.ocr_engine, OcrBackendType::Tesseract);
        assert_eq!(request.ocr_lang, "eng");
    }

    #[test]
    fn test_request_builders() {
        let request = ExtractionRequest::new("doc.pdf")
            .with_min_length(1)
            .with_force_ocr(true)
            .with_ocr_max_pages(0)
            .with_ocr_engine(OcrBackendType::Ocrs)
            .with_ocr_lang("deu");

        assert_eq!(request.min_length, 1);
        assert!(request.force_ocr);
        assert_eq!(request.ocr_max_pages, 1);
        assert_eq!(
            request.ocr_options(),
            OcrOptions {
                max_pages: 1,
                engine: OcrBackendType::Ocrs,
                lang: "deu".to_string(),
            }
        );
    }

    #[test]
    fn test_char_len_counts_characters() {
        assert_eq!(char_len(""), 0);
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("Четене"), 6);
    }
}
