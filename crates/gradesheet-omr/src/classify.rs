// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Checkbox classifier: decides whether one candidate box is marked.
//
// The crop is binarized twice (global Otsu and local-mean adaptive), the
// frame is trimmed away, specks are opened out, and two densities are
// measured on what is left: ink coverage and edge coverage. Any of three
// rules can declare the box checked:
//
//   * strong:   inner_ratio >= strong_inner_on_ratio
//   * vote:     clamp(inner_ratio + 0.5 * edge_ratio) >= min_vote_score
//   * weak:     inner_ratio >= min_inner_on_ratio && edge_ratio >= edge_density_thr

use gradesheet_core::ExamConfig;
use gradesheet_document::scan::{adaptive_ink, foreground_ratio, open_2x2, otsu_ink, union};
use image::{DynamicImage, GrayImage, imageops};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

use crate::shapes::DENOISE_SIGMA;

const ADAPTIVE_BLOCK_RADIUS: u32 = 5;
const ADAPTIVE_OFFSET: i32 = 2;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const EDGE_WEIGHT: f64 = 0.5;
const MIN_PAD: u32 = 2;

/// Outcome of scoring one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub checked: bool,
    /// Combined score in `[0, 1]`.
    pub score: f64,
    pub inner_ratio: f64,
    pub edge_ratio: f64,
    pub width: u32,
    pub height: u32,
    /// Frame margin trimmed on each side before measuring.
    pub pad: u32,
    /// Set when the crop had no pixels; such crops are never checked.
    pub empty_region: bool,
}

impl Classification {
    fn empty(width: u32, height: u32) -> Self {
        Self {
            checked: false,
            score: 0.0,
            inner_ratio: 0.0,
            edge_ratio: 0.0,
            width,
            height,
            pad: 0,
            empty_region: true,
        }
    }
}

/// A named intermediate image, kept for debug dumps.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: &'static str,
    pub image: DynamicImage,
}

/// Thresholds for the checked/unchecked decision, taken from [`ExamConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxClassifier {
    use_adaptive_threshold: bool,
    inner_crop_pct: f64,
    min_inner_on_ratio: f64,
    strong_inner_on_ratio: f64,
    edge_density_thr: f64,
    min_vote_score: f64,
}

impl CheckboxClassifier {
    pub fn from_config(cfg: &ExamConfig) -> Self {
        Self {
            use_adaptive_threshold: cfg.use_adaptive_threshold,
            inner_crop_pct: cfg.inner_crop_pct,
            min_inner_on_ratio: cfg.min_inner_on_ratio,
            strong_inner_on_ratio: cfg.strong_inner_on_ratio,
            edge_density_thr: cfg.edge_density_thr,
            min_vote_score: cfg.min_vote_score,
        }
    }

    /// Score one candidate crop.
    pub fn classify(&self, roi: &DynamicImage) -> Classification {
        self.run(roi, None)
    }

    /// Score one candidate crop and keep every intermediate image:
    /// `roi, gray, th_otsu, th, inner, inner_clean, edges`.
    pub fn classify_traced(&self, roi: &DynamicImage) -> (Classification, Vec<Stage>) {
        let mut stages = Vec::with_capacity(7);
        let result = self.run(roi, Some(&mut stages));
        (result, stages)
    }

    /// Apply the three decision rules to measured densities.
    /// Returns `(checked, score)`.
    pub fn decide(&self, inner_ratio: f64, edge_ratio: f64) -> (bool, f64) {
        let score = (inner_ratio + EDGE_WEIGHT * edge_ratio).clamp(0.0, 1.0);
        let strong = inner_ratio >= self.strong_inner_on_ratio;
        let weak = inner_ratio >= self.min_inner_on_ratio && edge_ratio >= self.edge_density_thr;
        (strong || score >= self.min_vote_score || weak, score)
    }

    fn run(&self, roi: &DynamicImage, mut trace: Option<&mut Vec<Stage>>) -> Classification {
        let (width, height) = (roi.width(), roi.height());
        if width == 0 || height == 0 {
            return Classification::empty(width, height);
        }
        record(&mut trace, "roi", || roi.clone());

        let gray = roi.to_luma8();
        record(&mut trace, "gray", || DynamicImage::ImageLuma8(gray.clone()));
        let blurred = gaussian_blur_f32(&gray, DENOISE_SIGMA);

        let (_, th_otsu) = otsu_ink(&blurred);
        record(&mut trace, "th_otsu", || DynamicImage::ImageLuma8(th_otsu.clone()));
        let th = if self.use_adaptive_threshold {
            union(
                &th_otsu,
                &adaptive_ink(&blurred, ADAPTIVE_BLOCK_RADIUS, ADAPTIVE_OFFSET),
            )
        } else {
            th_otsu
        };
        record(&mut trace, "th", || DynamicImage::ImageLuma8(th.clone()));

        let pad = MIN_PAD.max((width.min(height) as f64 * self.inner_crop_pct) as u32);
        let inner = inner_window(&th, pad);
        record(&mut trace, "inner", || DynamicImage::ImageLuma8(inner.clone()));

        let inner_clean = open_2x2(&inner);
        record(&mut trace, "inner_clean", || {
            DynamicImage::ImageLuma8(inner_clean.clone())
        });

        let edges = canny(&inner_clean, CANNY_LOW, CANNY_HIGH);
        let inner_ratio = foreground_ratio(&inner_clean);
        let edge_ratio = foreground_ratio(&edges);
        record(&mut trace, "edges", || DynamicImage::ImageLuma8(edges));

        let (checked, score) = self.decide(inner_ratio, edge_ratio);
        Classification {
            checked,
            score,
            inner_ratio,
            edge_ratio,
            width,
            height,
            pad,
            empty_region: false,
        }
    }
}

/// The mask with `pad` trimmed from every side. Falls back to the whole mask
/// when trimming leaves nothing.
fn inner_window(mask: &GrayImage, pad: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let span = |len: u32| {
        let end = (pad + 1).max(len.saturating_sub(pad)).min(len);
        (pad < end).then(|| (pad, end - pad))
    };
    match (span(w), span(h)) {
        (Some((x, cw)), Some((y, ch))) => imageops::crop_imm(mask, x, y, cw, ch).to_image(),
        _ => mask.clone(),
    }
}

fn record(trace: &mut Option<&mut Vec<Stage>>, name: &'static str, image: impl FnOnce() -> DynamicImage) {
    if let Some(stages) = trace {
        stages.push(Stage {
            name,
            image: image(),
        });
    }
}
