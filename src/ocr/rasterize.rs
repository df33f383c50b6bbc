//! PDF-to-image conversion for OCR.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;
use tracing::debug;

use super::backend::OcrError;
use super::model_utils::{find_binary, PDFTOPPM_NOT_FOUND};

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Ordered page images of one document, held in memory.
#[derive(Debug, Default)]
pub struct PageImages {
    pages: Vec<DynamicImage>,
}

impl PageImages {
    pub fn new(pages: Vec<DynamicImage>) -> Self {
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DynamicImage> {
        self.pages.iter()
    }
}

/// Converts a document into page images.
pub trait Rasterizer: Send + Sync {
    /// Check if the rasterizer can run at all.
    fn is_available(&self) -> bool;

    /// Render at most `max_pages` leading pages of the document.
    fn rasterize(&self, pdf_path: &Path, max_pages: u32) -> Result<PageImages, OcrError>;
}

/// Rasterizer backed by Poppler's pdftoppm.
pub struct PdftoppmRasterizer {
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    fn binary(&self) -> Result<PathBuf, OcrError> {
        find_binary("pdftoppm")
            .ok_or_else(|| OcrError::BackendNotAvailable(PDFTOPPM_NOT_FOUND.to_string()))
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn is_available(&self) -> bool {
        self.binary().is_ok()
    }

    fn rasterize(&self, pdf_path: &Path, max_pages: u32) -> Result<PageImages, OcrError> {
        let binary = self.binary()?;

        // Removed on drop, including on every error path below.
        let temp_dir = TempDir::new()?;
        let dpi = self.dpi.to_string();
        let last_page = max_pages.max(1).to_string();

        let output = Command::new(&binary)
            .args(["-png", "-r", &dpi, "-f", "1", "-l", &last_page])
            .arg(pdf_path)
            .arg(temp_dir.path().join("page"))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RasterizationFailed(format!(
                "pdftoppm failed: {}",
                stderr.trim()
            )));
        }

        let image_paths = list_page_images(temp_dir.path())?;
        if image_paths.is_empty() {
            return Err(OcrError::RasterizationFailed(
                "No images generated from PDF".to_string(),
            ));
        }

        let mut pages = Vec::with_capacity(image_paths.len());
        for path in &image_paths {
            let image = image::open(path)
                .map_err(|e| OcrError::ImageError(format!("Failed to load {:?}: {}", path, e)))?;
            pages.push(image);
        }

        debug!("Rasterized {} pages from {:?}", pages.len(), pdf_path);
        Ok(PageImages::new(pages))
    }
}

/// List the PNG files pdftoppm generated, in page order.
///
/// pdftoppm pads page numbers to the same width within one run
/// (page-01.png, page-02.png, ...), so a lexical sort is page order.
fn list_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
        .collect();
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_page_images_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"fake").unwrap();
        }

        let images = list_page_images(temp.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn test_list_page_images_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(list_page_images(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_page_images_len() {
        let pages = PageImages::new(vec![
            DynamicImage::new_rgb8(2, 2),
            DynamicImage::new_rgb8(2, 2),
        ]);
        assert_eq!(pages.len(), 2);
        assert!(!pages.is_empty());
        assert!(PageImages::default().is_empty());
    }
}
