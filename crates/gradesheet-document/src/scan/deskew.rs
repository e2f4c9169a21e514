// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation and skew correction for scanned answer sheets.
//
// Sheets are portrait. A landscape raster is turned 90 degrees clockwise, then
// the residual skew is estimated from the minimum-area rectangle enclosing all
// ink and undone by rotating about the centre.

use image::{DynamicImage, GrayImage, Rgb};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use tracing::{debug, info, instrument};

use super::binarize::otsu_ink;

/// Rotations smaller than this (degrees) are not worth resampling for.
pub const MIN_CORRECTION_DEGREES: f32 = 0.1;

/// Turn landscape rasters upright (90 degrees clockwise).
pub fn correct_orientation(image: DynamicImage) -> DynamicImage {
    if image.width() > image.height() {
        debug!(
            width = image.width(),
            height = image.height(),
            "Landscape page, rotating 90 degrees clockwise"
        );
        image.rotate90()
    } else {
        image
    }
}

/// Estimate the skew of the ink on a page, in degrees within (-45, 45].
///
/// Positive values mean the content is rotated clockwise. Returns `None` when
/// the page carries fewer than three ink pixels.
pub fn estimate_skew(gray: &GrayImage) -> Option<f32> {
    let (_, mask) = otsu_ink(gray);
    let points: Vec<Point<i32>> = mask
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] != 0)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();
    if points.len() < 3 {
        return None;
    }

    let rect = min_area_rect(&points);
    let dx = (rect[1].x - rect[0].x) as f32;
    let dy = (rect[1].y - rect[0].y) as f32;
    if dx == 0.0 && dy == 0.0 {
        return Some(0.0);
    }
    Some(normalise_quarter_turn(dy.atan2(dx).to_degrees()))
}

/// Fold an edge angle into (-45, 45]: a rectangle's edges are equivalent
/// modulo 90 degrees.
fn normalise_quarter_turn(mut degrees: f32) -> f32 {
    while degrees > 45.0 {
        degrees -= 90.0;
    }
    while degrees <= -45.0 {
        degrees += 90.0;
    }
    degrees
}

/// Correct orientation, then skew. Pages without measurable skew come back
/// unchanged apart from the orientation fix.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn deskew(image: DynamicImage) -> DynamicImage {
    let upright = correct_orientation(image);
    let gray = upright.to_luma8();

    let Some(angle) = estimate_skew(&gray) else {
        debug!("No ink found, skipping skew correction");
        return upright;
    };
    if angle.abs() < MIN_CORRECTION_DEGREES {
        debug!(angle, "Skew below correction threshold");
        return upright;
    }

    info!(angle, "Correcting page skew");
    let rgb = upright.to_rgb8();
    let rotated = rotate_about_center(
        &rgb,
        (-angle).to_radians(),
        Interpolation::Bilinear,
        Rgb([255u8, 255, 255]),
    );
    DynamicImage::ImageRgb8(rotated)
}
