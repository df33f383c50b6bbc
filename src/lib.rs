//! docsift - document text extraction with a cascade of fallbacks.
//!
//! Pulls readable text and metadata out of documents (primarily PDFs) with
//! strategies of increasing cost: Apache Tika, pdftotext, then OCR
//! (Tesseract or OCRS). [`extract::HybridExtractor`] decides which output
//! to keep based on text length.

pub mod cli;
pub mod config;
pub mod extract;
pub mod ocr;
