// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// gradesheet-document: Page acquisition for Gradesheet.
//
// Turns submitted documents (scanned PDFs, image files, directories of page
// images) into page rasters, and provides the low-level scan operations the
// grader builds on: ink binarization, morphology and deskew.

pub mod image;
pub mod pdf;
pub mod raster;
pub mod scan;

// Re-export the primary types so callers can use `gradesheet_document::PageImage` etc.
pub use image::processor::PageImage;
pub use pdf::reader::PdfReader;
pub use raster::{DocumentRasterizer, Rasterizer};
