// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization primitives for scanned answer sheets.
//
// Every mask produced here is "ink-foreground": pen and printed marks become
// `INK` (255), paper becomes 0. This is the polarity contour tracing and the
// checkbox metrics expect.

use image::{GrayImage, Luma, imageops};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};
use tracing::debug;

/// Foreground value in binary masks.
pub const INK: u8 = 255;

/// Compute the Otsu threshold for a grayscale image.
///
/// Returns the level `t` maximising the between-class variance of the
/// `[0, t]` and `(t, 255]` classes. A uniform image yields 0.
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Inverted global threshold: pixels at or below `level` become ink.
pub fn threshold_ink(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] <= level {
            Luma([INK])
        } else {
            Luma([0])
        }
    })
}

/// Otsu binarization with ink as foreground. Returns the chosen level too.
pub fn otsu_ink(gray: &GrayImage) -> (u8, GrayImage) {
    let level = otsu_level(gray);
    debug!(level, "Otsu threshold computed");
    (level, threshold_ink(gray, level))
}

/// Local-mean adaptive threshold with ink as foreground.
///
/// For each pixel the threshold is the mean intensity of the
/// `(2 * block_radius + 1)²` neighbourhood (clipped to the image) minus `c`.
/// Pixels at or below the threshold become ink, so uniform paper never does
/// when `c > 0`.
pub fn adaptive_ink(gray: &GrayImage, block_radius: u32, c: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, block_radius);
        let threshold = local_mean - c as f64;
        if (gray.get_pixel(x, y).0[0] as f64) <= threshold {
            Luma([INK])
        } else {
            Luma([0])
        }
    })
}

/// Pixel-wise union of two masks of equal size.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y).0[0].max(b.get_pixel(x, y).0[0])])
    })
}

/// Morphological opening with a 2x2 square element.
///
/// A pixel survives iff some 2x2 block containing it is entirely ink, which
/// removes isolated specks and one-pixel hairlines while leaving strokes of
/// width two or more in place. Pixels beyond the image count as paper.
pub fn open_2x2(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return mask.clone();
    }

    let mut padded = GrayImage::new(w + 2, h + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    // Erode over the block to the lower right, dilate back over the block
    // to the upper left so the result is not shifted.
    let block = GrayImage::from_pixel(2, 2, Luma([INK]));
    let erode_mask = Mask::from_image(&block, 0, 0);
    let dilate_mask = Mask::from_image(&block, 1, 1);
    let opened = grayscale_dilate(&grayscale_erode(&padded, &erode_mask), &dilate_mask);

    imageops::crop_imm(&opened, 1, 1, w, h).to_image()
}

/// Fraction of non-zero pixels. An empty image yields 0.0.
pub fn foreground_ratio(mask: &GrayImage) -> f64 {
    let total = mask.width() as u64 * mask.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let on = mask.pixels().filter(|p| p.0[0] != 0).count() as u64;
    on as f64 / total as f64
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within a square window centred on (cx, cy), clipped to
/// the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
