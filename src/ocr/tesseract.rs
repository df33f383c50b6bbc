//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.
//! This is the traditional, widely-available OCR option.

use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use super::backend::{OcrBackend, OcrBackendType, OcrError, PageRecognizer};
use super::model_utils::{find_binary, TESSERACT_NOT_FOUND};

/// Tesseract OCR backend.
#[derive(Debug, Default)]
pub struct TesseractBackend;

impl TesseractBackend {
    pub fn new() -> Self {
        Self
    }
}

impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        find_binary("tesseract").is_some()
    }

    fn availability_hint(&self) -> String {
        match find_binary("tesseract") {
            Some(path) => format!("Tesseract is available at {:?}", path),
            None => "Tesseract not installed. Install with: apt install tesseract-ocr".to_string(),
        }
    }

    fn open(&self, lang: &str) -> Result<Box<dyn PageRecognizer>, OcrError> {
        // Invoke by absolute path rather than relying on the child's PATH lookup.
        let binary = find_binary("tesseract")
            .ok_or_else(|| OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()))?;

        Ok(Box::new(TesseractRecognizer {
            binary,
            lang: lang.to_string(),
        }))
    }
}

/// Tesseract bound to one binary path and language.
struct TesseractRecognizer {
    binary: PathBuf,
    lang: String,
}

impl PageRecognizer for TesseractRecognizer {
    fn recognize_page(&self, page: &DynamicImage) -> Result<String, OcrError> {
        let image_file = tempfile::Builder::new()
            .prefix("docsift-page-")
            .suffix(".png")
            .tempfile()?;
        page.save_with_format(image_file.path(), ImageFormat::Png)
            .map_err(|e| OcrError::ImageError(format!("Failed to write page image: {}", e)))?;

        let output = Command::new(&self.binary)
            .arg(image_file.path())
            .arg("stdout")
            .args(["-l", &self.lang])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type() {
        assert_eq!(
            TesseractBackend::new().backend_type(),
            OcrBackendType::Tesseract
        );
    }

    #[test]
    fn test_availability_matches_open() {
        let backend = TesseractBackend::new();
        assert_eq!(backend.is_available(), backend.open("eng").is_ok());
    }

    #[test]
    fn test_missing_binary_reports_not_available() {
        let recognizer = TesseractRecognizer {
            binary: PathBuf::from("/nonexistent/docsift/tesseract"),
            lang: "eng".to_string(),
        };
        let result = recognizer.recognize_page(&DynamicImage::new_rgb8(4, 4));
        assert!(matches!(result, Err(OcrError::BackendNotAvailable(_))));
    }
}
