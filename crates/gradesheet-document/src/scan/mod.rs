// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: ink binarization, morphology helpers, orientation and
// skew correction.

pub mod binarize;
pub mod deskew;

pub use binarize::{
    INK, adaptive_ink, foreground_ratio, open_2x2, otsu_ink, otsu_level, threshold_ink, union,
};
pub use deskew::{correct_orientation, deskew, estimate_skew};
