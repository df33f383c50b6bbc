//! Document OCR: rasterize a PDF, then recognize a bounded page prefix.
//!
//! Nothing here returns an error to the caller. Each failure is caught at
//! the narrowest scope (rasterization, engine initialization, single page)
//! and turned into an empty contribution.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::backend::{OcrBackend, OcrBackendType, OcrConfig};
use super::rasterize::{PdftoppmRasterizer, Rasterizer};
use super::tesseract::TesseractBackend;

#[cfg(feature = "ocr-ocrs")]
use super::ocrs_backend::OcrsBackend;

/// Per-request OCR parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    /// Maximum number of leading pages to recognize.
    pub max_pages: u32,
    /// Recognition engine.
    pub engine: OcrBackendType,
    /// Language code (Tesseract style, e.g. "eng").
    pub lang: String,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            max_pages: 10,
            engine: OcrBackendType::Tesseract,
            lang: "eng".to_string(),
        }
    }
}

/// OCR over a whole document.
pub trait DocumentOcr: Send + Sync {
    /// Check if OCR can run at all (rasterizer present).
    fn is_available(&self) -> bool;

    /// Recognize the document's text. Returns an empty string on any failure.
    fn ocr_document(&self, file_path: &Path, options: &OcrOptions) -> String;
}

/// Rasterizer plus the registered recognition engines.
pub struct OcrPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    backends: Vec<Arc<dyn OcrBackend>>,
}

impl OcrPipeline {
    /// Create a pipeline with no engines registered.
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            rasterizer,
            backends: Vec::new(),
        }
    }

    /// Create the default pipeline: pdftoppm plus every compiled-in engine.
    pub fn with_defaults(dpi: u32, config: OcrConfig) -> Self {
        let mut pipeline = Self::new(Arc::new(PdftoppmRasterizer::new(dpi)));
        pipeline.register(Arc::new(TesseractBackend::new()));
        #[cfg(feature = "ocr-ocrs")]
        pipeline.register(Arc::new(OcrsBackend::new(config)));
        #[cfg(not(feature = "ocr-ocrs"))]
        let _ = config;
        pipeline
    }

    /// Register an engine.
    pub fn register(&mut self, backend: Arc<dyn OcrBackend>) {
        self.backends.push(backend);
    }

    /// Get a registered engine by type.
    pub fn get(&self, backend_type: OcrBackendType) -> Option<&dyn OcrBackend> {
        self.backends
            .iter()
            .find(|b| b.backend_type() == backend_type)
            .map(|b| b.as_ref())
    }

    /// List registered engines.
    pub fn backends(&self) -> impl Iterator<Item = &dyn OcrBackend> {
        self.backends.iter().map(|b| b.as_ref())
    }
}

impl DocumentOcr for OcrPipeline {
    fn is_available(&self) -> bool {
        self.rasterizer.is_available()
    }

    fn ocr_document(&self, file_path: &Path, options: &OcrOptions) -> String {
        if !self.rasterizer.is_available() {
            warn!("pdftoppm is not installed; cannot perform OCR.");
            return String::new();
        }

        if !is_pdf(file_path) {
            info!("OCR skipped: not a PDF file: {:?}", file_path);
            return String::new();
        }

        let pages = match self.rasterizer.rasterize(file_path, options.max_pages) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Failed to convert PDF to images: {}", e);
                return String::new();
            }
        };
        if pages.is_empty() {
            info!("OCR skipped: no pages rendered from {:?}", file_path);
            return String::new();
        }

        let Some(backend) = self.get(options.engine) else {
            warn!(
                "OCR engine '{}' is not available in this build. Supported: {}",
                options.engine,
                self.backends()
                    .map(|b| b.backend_type().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return String::new();
        };

        if !backend.is_available() {
            warn!("{}", backend.availability_hint());
            return String::new();
        }

        let recognizer = match backend.open(&options.lang) {
            Ok(recognizer) => recognizer,
            Err(e) => {
                warn!("{} failed to initialize: {}", options.engine, e);
                return String::new();
            }
        };

        info!(
            "OCR ({}): running on {} of {} rendered pages from {:?} with lang={}",
            options.engine,
            pages.len().min(options.max_pages as usize),
            pages.len(),
            file_path,
            options.lang
        );

        let chunks: Vec<String> = pages
            .iter()
            .take(options.max_pages as usize)
            .enumerate()
            .map(|(i, page)| {
                recognizer.recognize_page(page).unwrap_or_else(|e| {
                    warn!("{} failed on page {}: {}", options.engine, i + 1, e);
                    String::new()
                })
            })
            .collect();

        chunks.join("\n").trim().to_string()
    }
}

/// OCR only applies to PDF files.
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
