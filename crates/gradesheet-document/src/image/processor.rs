// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image: one rasterized answer-sheet page, with the handful of
// geometric operations the grading pipeline needs: orientation and skew
// correction, region crops, and PNG output.

use image::{DynamicImage, GrayImage, ImageFormat};
use gradesheet_core::Region;
use gradesheet_core::error::GradesheetError;
use tracing::{debug, info, instrument};

use crate::scan::deskew;

/// A single scanned page held in memory.
///
/// Transformations consume `self` and return a new `PageImage`, enabling
/// method chaining:
///
/// ```ignore
/// let gray = PageImage::open("page_1.png")?
///     .deskew()
///     .to_luma();
/// ```
#[derive(Debug, Clone)]
pub struct PageImage {
    image: DynamicImage,
}

impl PageImage {
    // -- Construction ---------------------------------------------------------

    /// Load a page from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, GradesheetError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            GradesheetError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Page loaded");
        Ok(Self { image: img })
    }

    /// Decode a page from raw encoded bytes (JPEG, PNG, TIFF).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, GradesheetError> {
        let img = image::load_from_memory(data).map_err(|err| {
            GradesheetError::ImageError(format!("failed to decode page image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Page decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Single intensity channel view of the page.
    pub fn to_luma(&self) -> GrayImage {
        self.image.to_luma8()
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate landscape rasters upright.
    pub fn correct_orientation(self) -> Self {
        Self {
            image: deskew::correct_orientation(self.image),
        }
    }

    /// Orientation plus skew correction.
    pub fn deskew(self) -> Self {
        Self {
            image: deskew::deskew(self.image),
        }
    }

    /// Copy out a region of the page. The region is clipped to the page;
    /// `None` when it lies entirely outside.
    #[instrument(skip(self), fields(region = %region))]
    pub fn crop(&self, region: Region) -> Option<DynamicImage> {
        let clipped = region.clamp_to(self.width(), self.height())?;
        debug!(clipped = %clipped, "Cropping page region");
        Some(
            self.image
                .crop_imm(clipped.x, clipped.y, clipped.width, clipped.height),
        )
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the page as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, GradesheetError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| GradesheetError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the page to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), GradesheetError> {
        self.image.save(path.as_ref()).map_err(|err| {
            GradesheetError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}
