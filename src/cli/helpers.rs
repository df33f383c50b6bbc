//! Output helpers for the CLI.
//!
//! Only the preview goes to stdout. Headers, metadata and hints go to
//! stderr so redirecting stdout yields clean text.

use std::io::Write;
use std::process::ExitCode;

use tracing::warn;

use crate::extract::{preview_text, ExtractionResult, Metadata};

/// How a CLI run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Text was extracted and printed.
    Success,
    /// The input file (or config file) could not be used.
    MissingInput,
    /// No strategy produced any text.
    NoText,
}

impl Outcome {
    pub fn code(&self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::MissingInput => 1,
            Outcome::NoText => 2,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// Print the extraction result and decide the outcome.
pub fn report(
    result: &ExtractionResult,
    preview_len: usize,
    verbose: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<Outcome> {
    if result.text.is_empty() {
        warn!("No text was extracted from the file. It may be a scanned image or otherwise unreadable.");
        if verbose && !result.metadata.is_empty() {
            write_metadata(&result.metadata, err)?;
        }
        writeln!(
            err,
            "Hint: try OCR (--ocr, requires pdftoppm and tesseract) if the document is scanned."
        )?;
        return Ok(Outcome::NoText);
    }

    writeln!(err, "\nExtracted text (first {} characters):\n", preview_len)?;
    writeln!(out, "{}", preview_text(&result.text, preview_len))?;

    if verbose {
        if result.metadata.is_empty() {
            writeln!(err, "\nMetadata (Tika):")?;
            writeln!(err, "(no metadata)")?;
        } else {
            write_metadata(&result.metadata, err)?;
        }
    }

    Ok(Outcome::Success)
}

fn write_metadata(metadata: &Metadata, err: &mut impl Write) -> std::io::Result<()> {
    writeln!(err, "\nMetadata (Tika):")?;
    for (key, value) in metadata {
        writeln!(err, "{}: {}", key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Provenance;

    fn result(text: &str, metadata: &[(&str, &str)]) -> ExtractionResult {
        ExtractionResult {
            text: text.to_string(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            provenance: Provenance::Structured,
        }
    }

    fn run(result: &ExtractionResult, preview_len: usize, verbose: bool) -> (Outcome, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = report(result, preview_len, verbose, &mut out, &mut err).unwrap();
        (
            outcome,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.code(), 0);
        assert_eq!(Outcome::MissingInput.code(), 1);
        assert_eq!(Outcome::NoText.code(), 2);
    }

    #[test]
    fn test_success_prints_only_preview_to_stdout() {
        let (outcome, out, err) = run(&result("abcdefgh", &[("a", "b")]), 3, false);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(out, "abc\n");
        assert!(err.contains("first 3 characters"));
        assert!(!err.contains("a: b"));
    }

    #[test]
    fn test_verbose_prints_metadata_to_stderr() {
        let (_, out, err) = run(&result("text", &[("a", "b")]), 10, true);
        assert_eq!(out, "text\n");
        assert!(err.contains("a: b"));
    }

    #[test]
    fn test_verbose_without_metadata() {
        let (_, _, err) = run(&result("text", &[]), 10, true);
        assert!(err.contains("(no metadata)"));
    }

    #[test]
    fn test_empty_text_reports_no_text() {
        let (outcome, out, err) = run(&result("", &[("dc:title", "Scan")]), 10, true);
        assert_eq!(outcome, Outcome::NoText);
        assert!(out.is_empty());
        let metadata_at = err.find("dc:title: Scan").unwrap();
        let hint_at = err.find("Hint").unwrap();
        assert!(metadata_at < hint_at);
    }

    #[test]
    fn test_empty_text_hides_metadata_unless_verbose() {
        let (outcome, _, err) = run(&result("", &[("dc:title", "Scan")]), 10, false);
        assert_eq!(outcome, Outcome::NoText);
        assert!(!err.contains("dc:title"));
    }
}
