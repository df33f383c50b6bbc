//! OCRS OCR backend implementation.
//!
//! Uses the ocrs crate for pure-Rust OCR without external binaries.
//! This is a lightweight, CPU-based OCR engine.
//!
//! Models are downloaded on first use (unless disabled) from:
//! https://ocrs-models.s3-accelerate.amazonaws.com/

use std::path::PathBuf;

use image::DynamicImage;
use tracing::{debug, warn};

use super::backend::{
    LanguageMap, OcrBackend, OcrBackendType, OcrConfig, OcrError, PageRecognizer,
};
use super::model_utils::{ensure_model_file, ModelDirConfig, ModelSpec};

/// Model directory configuration for OCRS.
const MODEL_CONFIG: ModelDirConfig = ModelDirConfig {
    subdir: "ocrs",
    required_files: &["text-detection.rten", "text-recognition.rten"],
};

const DETECTION_MODEL: ModelSpec = ModelSpec {
    url: "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten",
    filename: "text-detection.rten",
    size_hint: "2.5 MB",
};

const RECOGNITION_MODEL: ModelSpec = ModelSpec {
    url: "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten",
    filename: "text-recognition.rten",
    size_hint: "10 MB",
};

/// Languages the bundled recognition model covers (Latin alphabet).
const LATIN_LANGUAGES: &[&str] = &["en", "de", "fr", "es", "it", "pt", "nl"];

/// Reader language list for a Tesseract-style code.
fn reader_languages(map: &LanguageMap, lang: &str) -> Vec<String> {
    vec![map.map(lang).to_string()]
}

/// OCRS OCR backend (pure Rust).
pub struct OcrsBackend {
    config: OcrConfig,
    /// Standard model locations searched after `config.model_path`.
    search_dirs: Vec<PathBuf>,
}

impl OcrsBackend {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            search_dirs: MODEL_CONFIG.candidate_dirs(),
        }
    }

    /// Find the model directory, checking config path and standard locations.
    fn find_model_dir(&self) -> Option<PathBuf> {
        self.config
            .model_path
            .iter()
            .chain(self.search_dirs.iter())
            .find(|dir| MODEL_CONFIG.has_required_files(dir))
            .cloned()
    }

    /// Locate models, downloading them if allowed.
    fn ensure_models(&self) -> Result<PathBuf, OcrError> {
        if let Some(dir) = self.find_model_dir() {
            return Ok(dir);
        }

        if !self.config.download_models {
            return Err(OcrError::ModelNotFound(format!(
                "OCRS models not found and downloads are disabled (expected in {:?})",
                MODEL_CONFIG.default_dir()
            )));
        }

        let model_dir = MODEL_CONFIG.default_dir();
        std::fs::create_dir_all(&model_dir)?;

        ensure_model_file(&DETECTION_MODEL, &model_dir)?;
        ensure_model_file(&RECOGNITION_MODEL, &model_dir)?;

        Ok(model_dir)
    }

    fn load_engine(&self) -> Result<ocrs::OcrEngine, OcrError> {
        let model_dir = self.ensure_models()?;

        let detection_model = rten::Model::load_file(model_dir.join(DETECTION_MODEL.filename))
            .map_err(|e| OcrError::OcrFailed(format!("Failed to load detection model: {}", e)))?;
        let recognition_model =
            rten::Model::load_file(model_dir.join(RECOGNITION_MODEL.filename)).map_err(|e| {
                OcrError::OcrFailed(format!("Failed to load recognition model: {}", e))
            })?;

        ocrs::OcrEngine::new(ocrs::OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::OcrFailed(format!("Failed to create OCR engine: {}", e)))
    }
}

impl OcrBackend for OcrsBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Ocrs
    }

    fn is_available(&self) -> bool {
        self.config.download_models || self.find_model_dir().is_some()
    }

    fn availability_hint(&self) -> String {
        match self.find_model_dir() {
            Some(path) => format!("OCRS models found at {:?}", path),
            None if self.config.download_models => format!(
                "OCRS models will be auto-downloaded on first use (~12 MB total) to {:?}",
                MODEL_CONFIG.default_dir()
            ),
            None => format!(
                "OCRS models missing; place them in {:?}",
                MODEL_CONFIG.default_dir()
            ),
        }
    }

    fn open(&self, lang: &str) -> Result<Box<dyn PageRecognizer>, OcrError> {
        let languages = reader_languages(&self.config.language_map, lang);
        for language in &languages {
            if !LATIN_LANGUAGES.contains(&language.as_str()) {
                warn!(
                    "OCRS recognizes Latin script only; results for '{}' may be poor",
                    language
                );
            }
        }

        let engine = self.load_engine()?;
        debug!("OCRS reader initialized for {:?}", languages);
        Ok(Box::new(OcrsReader { engine, languages }))
    }
}

/// A single recognized text line.
struct RecognizedLine {
    text: String,
}

/// OCRS engine bound to a language list for one document.
struct OcrsReader {
    engine: ocrs::OcrEngine,
    languages: Vec<String>,
}

impl OcrsReader {
    fn read_lines(&self, page: &DynamicImage) -> Result<Vec<RecognizedLine>, OcrError> {
        // Dense RGB8 array, row-major.
        let rgb_img = page.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let img_source = ocrs::ImageSource::from_bytes(rgb_img.as_raw(), (width, height))
            .map_err(|e| OcrError::ImageError(format!("Failed to convert image: {}", e)))?;

        let input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to detect words: {}", e)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to recognize text: {}", e)))?;

        Ok(lines
            .into_iter()
            .flatten()
            .map(|line| RecognizedLine {
                text: line.to_string(),
            })
            .collect())
    }
}

impl PageRecognizer for OcrsReader {
    fn recognize_page(&self, page: &DynamicImage) -> Result<String, OcrError> {
        let lines = self.read_lines(page)?;
        debug!(
            "OCRS ({}) recognized {} lines",
            self.languages.join(","),
            lines.len()
        );
        Ok(lines
            .into_iter()
            .map(|line| line.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type() {
        let backend = OcrsBackend::new(OcrConfig::default());
        assert_eq!(backend.backend_type(), OcrBackendType::Ocrs);
    }

    fn isolated_backend(model_path: &std::path::Path, download_models: bool) -> OcrsBackend {
        OcrsBackend {
            config: OcrConfig {
                model_path: Some(model_path.to_path_buf()),
                download_models,
                ..OcrConfig::default()
            },
            search_dirs: Vec::new(),
        }
    }

    #[test]
    fn test_unavailable_without_models_or_downloads() {
        let temp = tempfile::TempDir::new().unwrap();
        let backend = isolated_backend(temp.path(), false);

        assert!(backend.find_model_dir().is_none());
        assert!(!backend.is_available());
        assert!(matches!(
            backend.ensure_models(),
            Err(OcrError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_configured_model_dir_is_used() {
        let temp = tempfile::TempDir::new().unwrap();
        for file in MODEL_CONFIG.required_files {
            std::fs::write(temp.path().join(file), b"model").unwrap();
        }
        let backend = isolated_backend(temp.path(), false);

        assert_eq!(backend.find_model_dir(), Some(temp.path().to_path_buf()));
        assert!(backend.is_available());
    }

    #[test]
    fn test_reader_languages_use_language_map() {
        let map = LanguageMap::default();
        assert_eq!(reader_languages(&map, "eng"), vec!["en".to_string()]);
        assert_eq!(reader_languages(&map, "fr"), vec!["fr".to_string()]);

        let mut extra = std::collections::BTreeMap::new();
        extra.insert("deu".to_string(), "de".to_string());
        let map = LanguageMap::with_overrides(&extra);
        assert_eq!(reader_languages(&map, "deu"), vec!["de".to_string()]);
    }
}
