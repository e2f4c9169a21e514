// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open scanned answer-sheet PDFs and pull the page rasters out
// of them using the `lopdf` crate.
//
// Scanner output embeds one image XObject per page. For each page the
// largest embedded image is taken as the page raster.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Document, ObjectId};
use gradesheet_core::error::GradesheetError;
use tracing::{debug, info, instrument, warn};

/// Reads scanned PDF files.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GradesheetError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            GradesheetError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, GradesheetError> {
        let document = Document::load_mem(data).map_err(|err| {
            GradesheetError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Extraction -----------------------------------------------------------

    /// Rasterize every page, in page order.
    ///
    /// Each entry is `Ok(image)` or the reason that page could not be
    /// decoded, so one damaged page does not sink the document.
    #[instrument(skip(self))]
    pub fn page_images(&self) -> Vec<Result<DynamicImage, GradesheetError>> {
        // get_pages() is a BTreeMap keyed by 1-indexed page number.
        self.document
            .get_pages()
            .into_iter()
            .map(|(page_number, page_id)| self.page_image(page_number, page_id))
            .collect()
    }

    /// Decode the largest image embedded in one page.
    fn page_image(&self, page_number: u32, page_id: ObjectId) -> Result<DynamicImage, GradesheetError> {
        let images = self.document.get_page_images(page_id).map_err(|err| {
            GradesheetError::PdfError(format!("page {}: cannot list images: {}", page_number, err))
        })?;

        let largest = images
            .into_iter()
            .max_by_key(|img| img.width.max(0) * img.height.max(0))
            .ok_or_else(|| {
                GradesheetError::UnsupportedDocument(format!(
                    "page {} has no embedded raster image",
                    page_number
                ))
            })?;

        let width = u32::try_from(largest.width).unwrap_or(0);
        let height = u32::try_from(largest.height).unwrap_or(0);
        let filters = largest.filters.clone().unwrap_or_default();
        debug!(
            page_number,
            width,
            height,
            ?filters,
            color_space = ?largest.color_space,
            "Decoding page image"
        );

        if filters.iter().any(|f| f == "DCTDecode") {
            return image::load_from_memory_with_format(&largest.content, ImageFormat::Jpeg)
                .map_err(|err| {
                    GradesheetError::ImageError(format!("page {}: JPEG decode failed: {}", page_number, err))
                });
        }

        let samples = if filters.is_empty() {
            largest.content.to_vec()
        } else {
            self.document
                .get_object(largest.id)
                .and_then(|obj| obj.as_stream())
                .and_then(|stream| stream.decompressed_content())
                .map_err(|err| {
                    GradesheetError::PdfError(format!(
                        "page {}: cannot decompress image stream: {}",
                        page_number, err
                    ))
                })?
        };

        let bits = largest.bits_per_component.unwrap_or(8);
        let color_space = largest.color_space.as_deref().unwrap_or("DeviceGray");
        decode_samples(&samples, width, height, bits, color_space).ok_or_else(|| {
            warn!(page_number, bits, color_space, "Unsupported image encoding");
            GradesheetError::UnsupportedDocument(format!(
                "page {}: unsupported image encoding ({} bpc, {})",
                page_number, bits, color_space
            ))
        })
    }
}

/// Turn raw image samples into a `DynamicImage`.
///
/// Handles 8-bit gray and RGB, and 1-bit gray (rows padded to whole bytes,
/// 1 = white as in the default `/Decode [0 1]`).
fn decode_samples(
    samples: &[u8],
    width: u32,
    height: u32,
    bits: i64,
    color_space: &str,
) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;
    match (bits, color_space) {
        (8, "DeviceGray") | (8, "CalGray") => {
            let data = samples.get(..pixels)?.to_vec();
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        (8, "DeviceRGB") | (8, "CalRGB") => {
            let data = samples.get(..pixels * 3)?.to_vec();
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        (1, "DeviceGray") => {
            let stride = (width as usize).div_ceil(8);
            if samples.len() < stride * height as usize {
                return None;
            }
            let gray = GrayImage::from_fn(width, height, |x, y| {
                let byte = samples[y as usize * stride + x as usize / 8];
                let bit = (byte >> (7 - (x % 8))) & 1;
                image::Luma([if bit == 1 { 255 } else { 0 }])
            });
            Some(DynamicImage::ImageLuma8(gray))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{DocumentRasterizer, Rasterizer};
    use image::Rgb;
    use lopdf::{Object, Stream, dictionary};
    use std::io::Cursor;

    fn image_dict(width: i64, height: i64, color_space: &str, bits: i64) -> lopdf::Dictionary {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => bits,
        }
    }

    /// Flate-compressed 8-bit gray image of one shade.
    fn flate_gray(width: i64, height: i64, shade: u8) -> Stream {
        let samples = vec![shade; (width * height) as usize];
        let mut stream = Stream::new(image_dict(width, height, "DeviceGray", 8), samples);
        stream.compress().unwrap();
        assert!(stream.dict.get(b"Filter").is_ok());
        stream
    }

    /// Flate-compressed 1-bit gray image, every pixel white.
    fn flate_one_bit_white(width: i64, height: i64) -> Stream {
        let stride = (width as usize).div_ceil(8);
        let samples = vec![0xFF; stride * height as usize];
        let mut stream = Stream::new(image_dict(width, height, "DeviceGray", 1), samples);
        stream.compress().unwrap();
        stream
    }

    /// Baseline JPEG of one RGB colour.
    fn dct_rgb(width: u32, height: u32, colour: [u8; 3]) -> Stream {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let mut dict = image_dict(width.into(), height.into(), "DeviceRGB", 8);
        dict.set("Filter", "DCTDecode");
        Stream::new(dict, jpeg)
    }

    /// Build a PDF where each page embeds the given images. A page with no
    /// images only carries vector drawing operators.
    fn build_pdf(pages: Vec<Vec<Stream>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();

        for images in pages {
            let contents = doc.add_object(Stream::new(
                dictionary! {},
                b"0 0 m 100 100 l S".to_vec(),
            ));
            let mut resources = dictionary! {};
            if !images.is_empty() {
                let mut xobjects = dictionary! {};
                for (index, image) in images.into_iter().enumerate() {
                    let id = doc.add_object(image);
                    xobjects.set(format!("Im{}", index), id);
                }
                resources.set("XObject", xobjects);
            }
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0, 0, 612, 792].into_iter().map(Object::Integer).collect::<Vec<_>>(),
                "Resources" => resources,
                "Contents" => contents,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn write_pdf(dir: &Path, pages: Vec<Vec<Stream>>) -> std::path::PathBuf {
        let path = dir.join("sheet.pdf");
        std::fs::write(&path, build_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn reads_flate_gray_and_dct_rgb_pages_in_order() {
        let bytes = build_pdf(vec![
            vec![flate_gray(200, 200, 90)],
            vec![dct_rgb(16, 16, [200, 10, 12])],
        ]);
        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images();
        assert_eq!(pages.len(), 2);

        let gray = pages[0].as_ref().unwrap();
        assert_eq!((gray.width(), gray.height()), (200, 200));
        assert_eq!(gray.to_luma8().get_pixel(10, 150).0[0], 90);

        let rgb = pages[1].as_ref().unwrap();
        assert_eq!((rgb.width(), rgb.height()), (16, 16));
        let px = rgb.to_rgb8().get_pixel(1, 0).0;
        assert!(px[0] > 150, "red channel {}", px[0]);
        assert!(px[1] < 60 && px[2] < 60, "green/blue {:?}", px);
    }

    #[test]
    fn largest_embedded_image_is_the_page() {
        let bytes = build_pdf(vec![vec![
            flate_gray(20, 20, 10),
            flate_gray(120, 80, 200),
            flate_gray(40, 30, 60),
        ]]);
        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images();
        let page = pages[0].as_ref().unwrap();
        assert_eq!((page.width(), page.height()), (120, 80));
        assert_eq!(page.to_luma8().get_pixel(0, 0).0[0], 200);
    }

    #[test]
    fn one_bit_flate_page_decodes() {
        let bytes = build_pdf(vec![vec![flate_one_bit_white(61, 40)]]);
        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images();
        let page = pages[0].as_ref().unwrap().to_luma8();
        assert_eq!(page.dimensions(), (61, 40));
        assert_eq!(page.get_pixel(60, 39).0[0], 255);
    }

    #[test]
    fn vector_only_page_is_an_error_entry() {
        let bytes = build_pdf(vec![vec![flate_gray(30, 30, 5)], vec![]]);
        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_ok());
        assert!(pages[1].is_err());
    }

    #[test]
    fn rasterizer_skips_vector_only_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(
            dir.path(),
            vec![
                vec![flate_gray(200, 200, 90)],
                vec![],
                vec![dct_rgb(16, 16, [200, 10, 12])],
            ],
        );
        let pages = DocumentRasterizer::new().convert(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].width(), 200);
        assert_eq!(pages[1].width(), 16);
    }

    #[test]
    fn all_vector_pdf_is_an_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), vec![vec![], vec![]]);
        let err = DocumentRasterizer::new().convert(&path).unwrap_err();
        assert!(matches!(err, GradesheetError::EmptyDocument(_)));
    }

    #[test]
    fn decodes_eight_bit_gray() {
        let img = decode_samples(&[0, 64, 128, 255], 2, 2, 8, "DeviceGray").unwrap();
        let gray = img.to_luma8();
        assert_eq!(gray.get_pixel(1, 1).0[0], 255);
        assert_eq!(gray.get_pixel(1, 0).0[0], 64);
    }

    #[test]
    fn decodes_one_bit_gray_with_row_padding() {
        // 3 pixels wide: row 0 = 1,0,1 ; row 1 = 0,1,0
        let img = decode_samples(&[0b1010_0000, 0b0100_0000], 3, 2, 1, "DeviceGray").unwrap();
        let gray = img.to_luma8();
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
        assert_eq!(gray.get_pixel(1, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn short_sample_buffer_is_rejected() {
        assert!(decode_samples(&[1, 2, 3], 2, 2, 8, "DeviceRGB").is_none());
        assert!(decode_samples(&[0; 12], 2, 2, 16, "DeviceRGB").is_none());
    }

    #[test]
    fn garbage_bytes_are_pdf_errors() {
        let err = PdfReader::from_bytes(b"not a pdf at all").err().unwrap();
        assert!(matches!(err, GradesheetError::PdfError(_)));
    }
}
