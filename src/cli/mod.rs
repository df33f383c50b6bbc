//! CLI implementation.
//!
//! This module contains the CLI parser and drives one extraction request.

mod helpers;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::extract::{ExtractionRequest, HybridExtractor};
use crate::ocr::OcrBackendType;

pub use helpers::{report, Outcome};

#[derive(Parser, Debug)]
#[command(name = "docsift")]
#[command(
    about = "Extract text from PDF (or other) files using Tika with pdftotext and OCR fallbacks, and show a preview"
)]
#[command(version)]
pub struct Cli {
    /// Path to the PDF (or other) file to extract
    pub file: PathBuf,

    /// Number of characters to show in the preview
    #[arg(long, default_value = "50000", allow_negative_numbers = true)]
    pub preview: i64,

    /// Minimum characters from Tika before trying the pdftotext fallback
    #[arg(long, default_value = "50000")]
    pub min_length: usize,

    /// Show metadata and extra logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Force OCR and prefer its output whenever it yields text
    #[arg(long)]
    pub ocr: bool,

    /// Max pages for OCR
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
    pub ocr_max_pages: u32,

    /// Which OCR engine to use
    #[arg(long, value_enum, default_value = "tesseract")]
    pub ocr_engine: OcrBackendType,

    /// Language code for OCR (Tesseract codes like 'eng')
    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, env = "DOCSIFT_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Build the extraction request described by the arguments.
    pub fn request(&self) -> ExtractionRequest {
        ExtractionRequest::new(&self.file)
            .with_min_length(self.min_length)
            .with_force_ocr(self.ocr)
            .with_ocr_max_pages(self.ocr_max_pages)
            .with_ocr_engine(self.ocr_engine)
            .with_ocr_lang(&self.ocr_lang)
    }

    /// Preview length, with negative values clamped to zero.
    pub fn preview_len(&self) -> usize {
        usize::try_from(self.preview.max(0)).unwrap_or(usize::MAX)
    }
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Parse arguments and run one extraction.
pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if !cli.file.exists() {
        error!("File does not exist: {}", cli.file.display());
        return Ok(Outcome::MissingInput.into());
    }

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return Ok(Outcome::MissingInput.into());
        }
    };
    if let Some(ref path) = settings.source_path {
        debug!("Loaded config from {:?}", path);
    }

    let extractor = HybridExtractor::from_settings(&settings);
    if cli.verbose {
        for (name, available, hint) in extractor.capabilities() {
            info!(
                "{}: {} {}",
                name,
                if available { "available" } else { "missing" },
                hint
            );
        }
    }

    let result = extractor.extract(&cli.request());
    info!(
        "Extracted {} characters via {}",
        result.text.chars().count(),
        result.provenance
    );

    let outcome = report(
        &result,
        cli.preview_len(),
        cli.verbose,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    Ok(outcome.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["docsift", "doc.pdf"]).unwrap();
        assert_eq!(cli.preview_len(), 50_000);
        assert_eq!(cli.min_length, 50_000);
        assert!(!cli.ocr);
        assert!(!cli.verbose);

        let request = cli.request();
        assert_eq!(request.file_path, PathBuf::from("doc.pdf"));
        assert_eq!(request.ocr_max_pages, 10);
        assert_eq!(request.ocr_engine, OcrBackendType::Tesseract);
        assert_eq!(request.ocr_lang, "eng");
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "docsift",
            "scan.pdf",
            "--preview",
            "100",
            "--min-length",
            "10",
            "--ocr",
            "--ocr-max-pages",
            "3",
            "--ocr-engine",
            "ocrs",
            "--ocr-lang",
            "deu",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.preview_len(), 100);
        assert!(cli.verbose);
        let request = cli.request();
        assert_eq!(request.min_length, 10);
        assert!(request.force_ocr);
        assert_eq!(request.ocr_max_pages, 3);
        assert_eq!(request.ocr_engine, OcrBackendType::Ocrs);
        assert_eq!(request.ocr_lang, "deu");
    }

    #[test]
    fn test_negative_preview_clamps_to_zero() {
        let cli = Cli::try_parse_from(["docsift", "doc.pdf", "--preview", "-5"]).unwrap();
        assert_eq!(cli.preview_len(), 0);
    }

    #[test]
    fn test_rejects_unknown_engine_and_zero_pages() {
        assert!(Cli::try_parse_from(["docsift", "doc.pdf", "--ocr-engine", "easyocr"]).is_err());
        assert!(Cli::try_parse_from(["docsift", "doc.pdf", "--ocr-max-pages", "0"]).is_err());
    }

    #[test]
    fn test_file_is_required() {
        assert!(Cli::try_parse_from(["docsift"]).is_err());
    }
}
