//! Hybrid extraction: Tika first, pdftotext when Tika's text is short, OCR
//! when both are short or when OCR is forced.
//!
//! Text length (in characters) is the only quality signal. Strategies run
//! strictly in order and OCR runs at most once per request.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::{
    char_len, DocumentExtractor, ExtractionRequest, ExtractionResult, PdfTextExtractor,
    Provenance, TikaExtractor,
};
use crate::config::Settings;
use crate::ocr::{DocumentOcr, OcrConfig, OcrPipeline};

/// The fallback orchestrator.
pub struct HybridExtractor {
    structured: Arc<dyn DocumentExtractor>,
    page_text: Arc<dyn DocumentExtractor>,
    ocr: Arc<dyn DocumentOcr>,
}

impl HybridExtractor {
    /// Assemble an orchestrator from explicit strategies.
    pub fn new(
        structured: Arc<dyn DocumentExtractor>,
        page_text: Arc<dyn DocumentExtractor>,
        ocr: Arc<dyn DocumentOcr>,
    ) -> Self {
        Self {
            structured,
            page_text,
            ocr,
        }
    }

    /// Production wiring: Tika server, pdftotext and the OCR pipeline.
    pub fn from_settings(settings: &Settings) -> Self {
        let ocr_config = OcrConfig {
            model_path: settings.ocr.model_dir.clone(),
            download_models: settings.ocr.download_models,
            language_map: settings.ocr.language_map(),
        };

        Self::new(
            Arc::new(TikaExtractor::new(settings.tika.clone())),
            Arc::new(PdfTextExtractor::new()),
            Arc::new(OcrPipeline::with_defaults(settings.ocr.dpi, ocr_config)),
        )
    }

    /// Availability of each strategy as (name, available, hint).
    pub fn capabilities(&self) -> Vec<(&'static str, bool, String)> {
        vec![
            (
                self.structured.name(),
                self.structured.is_available(),
                self.structured.availability_hint(),
            ),
            (
                self.page_text.name(),
                self.page_text.is_available(),
                self.page_text.availability_hint(),
            ),
            ("ocr", self.ocr.is_available(), String::new()),
        ]
    }

    /// Run the fallback policy for one request.
    pub fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        let path: &Path = &request.file_path;

        let structured = self.structured.extract(path);
        let metadata = structured.metadata;
        let structured_text = structured.text;

        if char_len(&structured_text) >= request.min_length && !request.force_ocr {
            debug!("Structured text meets threshold, skipping fallbacks");
            return ExtractionResult {
                text: structured_text,
                metadata,
                provenance: Provenance::Structured,
            };
        }

        let page_text = self.page_text.extract(path).text;

        // Ties keep the structured text, whose metadata is returned anyway.
        let (candidate, candidate_provenance) =
            if char_len(&structured_text) >= char_len(&page_text) {
                (structured_text, Provenance::Structured)
            } else {
                (page_text, Provenance::PageText)
            };

        if request.force_ocr {
            let ocr_text = self.ocr.ocr_document(path, &request.ocr_options());
            if !ocr_text.is_empty() {
                debug!("Forced OCR produced text");
                return ExtractionResult {
                    text: ocr_text,
                    metadata,
                    provenance: Provenance::Ocr,
                };
            }
            debug!("Forced OCR produced nothing, using {}", candidate_provenance);
            return ExtractionResult {
                text: candidate,
                metadata,
                provenance: candidate_provenance,
            };
        }

        let candidate_len = char_len(&candidate);
        if candidate_len < request.min_length {
            info!("Extracted text is shorter than the threshold, trying OCR...");
            let ocr_text = self.ocr.ocr_document(path, &request.ocr_options());
            if char_len(&ocr_text) > candidate_len {
                debug!("OCR text is longer than {} text", candidate_provenance);
                return ExtractionResult {
                    text: ocr_text,
                    metadata,
                    provenance: Provenance::Ocr,
                };
            }
        }

        debug!("Using {} text", candidate_provenance);
        ExtractionResult {
            text: candidate,
            metadata,
            provenance: candidate_provenance,
        }
    }
}
