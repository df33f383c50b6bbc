//! OCR sub-pipeline.
//!
//! Converts PDF pages to images with pdftoppm (Poppler) and recognizes them
//! with one of:
//!
//! - **Tesseract**: traditional OCR, widely available, CPU-based (default)
//! - **OCRS**: pure Rust OCR, no external binaries (feature: ocr-ocrs)

mod backend;
mod model_utils;
mod pipeline;
mod rasterize;
mod tesseract;

#[cfg(feature = "ocr-ocrs")]
mod ocrs_backend;

pub use backend::{
    LanguageMap, OcrBackend, OcrBackendType, OcrConfig, OcrError, PageRecognizer,
};
pub use model_utils::find_binary;
pub use pipeline::{DocumentOcr, OcrOptions, OcrPipeline};
pub use rasterize::{PageImages, PdftoppmRasterizer, Rasterizer, DEFAULT_DPI};
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-ocrs")]
pub use ocrs_backend::OcrsBackend;
