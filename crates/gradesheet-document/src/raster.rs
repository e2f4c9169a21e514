// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizer: turn a submitted document into an ordered list of page
// images. PDFs, single image files and directories of page images are
// accepted.

use std::path::{Path, PathBuf};

use gradesheet_core::DocumentType;
use gradesheet_core::error::GradesheetError;
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::image::PageImage;
use crate::pdf::PdfReader;

/// Converts a document into page images, first page first.
pub trait Rasterizer: Send + Sync {
    fn convert(&self, document: &Path) -> Result<Vec<DynamicImage>, GradesheetError>;
}

/// Default rasterizer backed by `lopdf` and `image`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentRasterizer;

impl DocumentRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn convert_pdf(&self, path: &Path) -> Result<Vec<DynamicImage>, GradesheetError> {
        let reader = PdfReader::open(path)?;
        Ok(keep_decoded(path, reader.page_images()))
    }

    fn convert_directory(&self, dir: &Path) -> Result<Vec<DynamicImage>, GradesheetError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_raster_file(p))
            .collect();
        files.sort_by_cached_key(|p| page_sort_key(p));

        let pages = files
            .iter()
            .map(|file| PageImage::open(file).map(PageImage::into_dynamic))
            .collect();
        Ok(keep_decoded(dir, pages))
    }
}

impl Rasterizer for DocumentRasterizer {
    #[instrument(skip(self), fields(document = %document.display()))]
    fn convert(&self, document: &Path) -> Result<Vec<DynamicImage>, GradesheetError> {
        if !document.exists() {
            return Err(GradesheetError::DocumentNotFound(document.to_path_buf()));
        }

        let pages = if document.is_dir() {
            self.convert_directory(document)?
        } else {
            match document_type(document) {
                Some(DocumentType::Pdf) => self.convert_pdf(document)?,
                Some(_) => vec![PageImage::open(document)?.into_dynamic()],
                None => {
                    return Err(GradesheetError::UnsupportedDocument(format!(
                        "{}: unrecognised file extension",
                        document.display()
                    )));
                }
            }
        };

        if pages.is_empty() {
            return Err(GradesheetError::EmptyDocument(document.display().to_string()));
        }
        info!(pages = pages.len(), "Document rasterized");
        Ok(pages)
    }
}

fn document_type(path: &Path) -> Option<DocumentType> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(DocumentType::from_extension)
}

fn is_raster_file(path: &Path) -> bool {
    document_type(path).is_some_and(|t| t.is_raster())
}

/// Order `page_2.png` before `page_10.png`: file stems compare by their
/// text prefix, then by the trailing page number, then by full name.
fn page_sort_key(path: &Path) -> (String, Option<u64>, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = stem[prefix.len()..].parse().ok();
    (prefix.to_string(), number, name)
}

/// Drop pages that failed to decode, logging each one.
fn keep_decoded(
    source: &Path,
    pages: Vec<Result<DynamicImage, GradesheetError>>,
) -> Vec<DynamicImage> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(index, page)| match page {
            Ok(img) => Some(img),
            Err(err) => {
                warn!(source = %source.display(), page = index + 1, %err, "Skipping undecodable page");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_page(dir: &Path, name: &str, shade: u8) {
        GrayImage::from_pixel(8, 8, Luma([shade]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn missing_path_is_not_found() {
        let err = DocumentRasterizer::new()
            .convert(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, GradesheetError::DocumentNotFound(_)));
    }

    #[test]
    fn directory_pages_are_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "page_2.png", 200);
        write_page(dir.path(), "page_1.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let pages = DocumentRasterizer::new().convert(dir.path()).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].to_luma8().get_pixel(0, 0).0[0], 10);
        assert_eq!(pages[1].to_luma8().get_pixel(0, 0).0[0], 200);
    }

    #[test]
    fn directory_pages_sort_by_page_number() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "page_10.png", 100);
        write_page(dir.path(), "page_2.png", 20);
        write_page(dir.path(), "page_1.png", 10);

        let pages = DocumentRasterizer::new().convert(dir.path()).unwrap();
        let shades: Vec<u8> = pages
            .iter()
            .map(|p| p.to_luma8().get_pixel(0, 0).0[0])
            .collect();
        assert_eq!(shades, vec![10, 20, 100]);
    }

    #[test]
    fn sort_key_splits_trailing_number() {
        let key = page_sort_key(Path::new("/scans/page_012.png"));
        assert_eq!(key, ("page_".to_string(), Some(12), "page_012.png".to_string()));
        assert!(page_sort_key(Path::new("cover.png")).1.is_none());
    }

    #[test]
    fn directory_without_images_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();
        let err = DocumentRasterizer::new().convert(dir.path()).unwrap_err();
        assert!(matches!(err, GradesheetError::EmptyDocument(_)));
    }

    #[test]
    fn single_image_is_one_page() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "scan.png", 128);
        let pages = DocumentRasterizer::new()
            .convert(&dir.path().join("scan.png"))
            .unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn undecodable_directory_page_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.png", 50);
        std::fs::write(dir.path().join("b.png"), b"broken").unwrap();
        let pages = DocumentRasterizer::new().convert(dir.path()).unwrap();
        assert_eq!(pages.len(), 1);
    }
}
