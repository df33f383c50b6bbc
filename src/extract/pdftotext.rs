//! Page-by-page text extraction using pdftotext (Poppler).

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::{DocumentExtractor, Extracted, ExtractionError};
use crate::ocr::find_binary;

const PDFTOTEXT_NOT_FOUND: &str = "pdftotext (install poppler-utils)";
const PDFINFO_NOT_FOUND: &str = "pdfinfo (install poppler-utils)";

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Page-text extractor. Never produces metadata.
#[derive(Debug, Default)]
pub struct PdfTextExtractor {
    /// Explicit `(pdfinfo, pdftotext)` paths; looked up on PATH when unset.
    binaries: Option<(PathBuf, PathBuf)>,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given pdfinfo and pdftotext executables instead of PATH lookups.
    pub fn with_binaries(pdfinfo: impl Into<PathBuf>, pdftotext: impl Into<PathBuf>) -> Self {
        Self {
            binaries: Some((pdfinfo.into(), pdftotext.into())),
        }
    }

    fn tools(&self) -> Result<(PathBuf, PathBuf), ExtractionError> {
        if let Some(ref binaries) = self.binaries {
            return Ok(binaries.clone());
        }
        let pdfinfo = find_binary("pdfinfo")
            .ok_or_else(|| ExtractionError::ToolNotFound(PDFINFO_NOT_FOUND.to_string()))?;
        let pdftotext = find_binary("pdftotext")
            .ok_or_else(|| ExtractionError::ToolNotFound(PDFTOTEXT_NOT_FOUND.to_string()))?;
        Ok((pdfinfo, pdftotext))
    }

    /// Get the page count of a PDF.
    fn page_count(&self, pdfinfo: &Path, file_path: &Path) -> Result<u32, ExtractionError> {
        let output = handle_cmd_output(
            Command::new(pdfinfo).arg(file_path).output(),
            PDFINFO_NOT_FOUND,
            "pdfinfo failed to open file",
        )?;

        parse_page_count(&output).ok_or_else(|| {
            ExtractionError::ExtractionFailed("pdfinfo reported no page count".to_string())
        })
    }

    /// Run pdftotext on a single page of a PDF file.
    fn page_text(
        &self,
        pdftotext: &Path,
        file_path: &Path,
        page: u32,
    ) -> Result<String, ExtractionError> {
        let page_str = page.to_string();
        let output = Command::new(pdftotext)
            .args(["-enc", "UTF-8", "-nopgbrk", "-f", &page_str, "-l", &page_str])
            .arg(file_path)
            .arg("-")
            .output();

        handle_cmd_output(
            output,
            PDFTOTEXT_NOT_FOUND,
            &format!("pdftotext failed on page {}", page),
        )
    }

    /// Concatenate page texts into `text`, stopping at the first error.
    fn read_pages(&self, file_path: &Path, text: &mut String) -> Result<(), ExtractionError> {
        let (pdfinfo, pdftotext) = self.tools()?;
        let pages = self.page_count(&pdfinfo, file_path)?;

        for page in 1..=pages {
            text.push_str(&self.page_text(&pdftotext, file_path, page)?);
        }
        Ok(())
    }
}

impl DocumentExtractor for PdfTextExtractor {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn is_available(&self) -> bool {
        self.tools().is_ok()
    }

    fn availability_hint(&self) -> String {
        if !self.is_available() {
            "pdftotext/pdfinfo not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "pdftotext is available".to_string()
        }
    }

    fn extract(&self, file_path: &Path) -> Extracted {
        info!("Reading with pdftotext: {:?}", file_path);

        let mut text = String::new();
        match self.read_pages(file_path, &mut text) {
            Ok(()) => {}
            Err(ExtractionError::ToolNotFound(tool)) => {
                warn!("pdftotext is not available: {} not found", tool);
            }
            Err(e) if text.is_empty() => {
                warn!("pdftotext failed to read file: {}", e);
            }
            Err(e) => {
                warn!("Error while reading pages with pdftotext, keeping partial text: {}", e);
            }
        }

        Extracted::text(text.trim())
    }
}

/// Parse the `Pages:` line of pdfinfo output.
fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|count| count.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let output = "Title:          Report\nProducer:       LaTeX\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output), Some(12));
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: x\n"), None);
        assert_eq!(parse_page_count("Pages: many\n"), None);
    }

    #[test]
    fn test_missing_file_yields_empty_text() {
        let extractor = PdfTextExtractor::new();
        let extracted = extractor.extract(Path::new("/nonexistent/docsift/missing.pdf"));
        assert_eq!(extracted, Extracted::default());
    }

    /// Write an executable shell script into `dir`.
    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Stub tools for a 3-page document whose second page cannot be read.
    #[cfg(unix)]
    fn failing_second_page(dir: &Path) -> PdfTextExtractor {
        let pdfinfo = write_script(dir, "pdfinfo", "echo 'Pages:          3'");
        // Arguments: -enc UTF-8 -nopgbrk -f N -l N <file> -
        let pdftotext = write_script(
            dir,
            "pdftotext",
            r#"case "$5" in
  1) printf '  page1 text' ;;
  2) echo 'Syntax Error: broken xref' >&2; exit 1 ;;
  *) printf 'page3 text' ;;
esac"#,
        );
        PdfTextExtractor::with_binaries(pdfinfo, pdftotext)
    }

    #[cfg(unix)]
    #[test]
    fn test_mid_document_failure_keeps_earlier_pages() {
        let temp = tempfile::TempDir::new().unwrap();
        let extractor = failing_second_page(temp.path());

        assert!(extractor.is_available());
        let extracted = extractor.extract(&temp.path().join("doc.pdf"));
        assert_eq!(extracted.text, "page1 text");
        assert!(extracted.metadata.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_pages_concatenated_without_separator() {
        let temp = tempfile::TempDir::new().unwrap();
        let pdfinfo = write_script(temp.path(), "pdfinfo", "echo 'Pages: 2'");
        let pdftotext = write_script(temp.path(), "pdftotext", r#"printf 'p%s ' "$5""#);
        let extractor = PdfTextExtractor::with_binaries(pdfinfo, pdftotext);

        let extracted = extractor.extract(&temp.path().join("doc.pdf"));
        assert_eq!(extracted.text, "p1 p2");
    }

    #[cfg(unix)]
    #[test]
    fn test_unopenable_file_yields_empty_text() {
        let temp = tempfile::TempDir::new().unwrap();
        let pdfinfo = write_script(temp.path(), "pdfinfo", "echo 'I/O Error' >&2; exit 1");
        let pdftotext = write_script(temp.path(), "pdftotext", "printf 'never'");
        let extractor = PdfTextExtractor::with_binaries(pdfinfo, pdftotext);

        assert_eq!(
            extractor.extract(&temp.path().join("doc.pdf")),
            Extracted::default()
        );
    }

    #[test]
    fn test_handle_cmd_output_not_found() {
        let result = handle_cmd_output(
            Err(std::io::Error::from(std::io::ErrorKind::NotFound)),
            "tool",
            "failed",
        );
        assert!(matches!(result, Err(ExtractionError::ToolNotFound(t)) if t == "tool"));
    }
}
