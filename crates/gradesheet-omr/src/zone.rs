// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zone detection capability: coarsely locates the answer area on a page.
//
// A learned detector is an optional collaborator; the trait lets the page
// orchestrator ask whether one is present and fall back when it is not.

use gradesheet_core::{ExamConfig, Region};
use image::DynamicImage;
use tracing::debug;

/// A detected answer area, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedZone {
    pub region: Region,
    pub confidence: f64,
}

/// Locates the grading zone on a page.
///
/// `detect` must return `None` on no detection or internal failure; it never
/// panics or errors to the caller.
pub trait ZoneDetector: Send + Sync {
    fn is_available(&self) -> bool;

    fn detect(&self, page: &DynamicImage, cfg: &ExamConfig) -> Option<DetectedZone>;
}

/// No detector installed. Pages are processed whole.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullZoneDetector;

impl ZoneDetector for NullZoneDetector {
    fn is_available(&self) -> bool {
        false
    }

    fn detect(&self, _page: &DynamicImage, _cfg: &ExamConfig) -> Option<DetectedZone> {
        None
    }
}

/// Reports the configured `zone_region` with full confidence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedZoneDetector;

impl ZoneDetector for FixedZoneDetector {
    fn is_available(&self) -> bool {
        true
    }

    fn detect(&self, page: &DynamicImage, cfg: &ExamConfig) -> Option<DetectedZone> {
        let region = cfg.zone_region?.clamp_to(page.width(), page.height())?;
        Some(DetectedZone {
            region,
            confidence: 1.0,
        })
    }
}

/// Grow `zone` by `factor` of its size on each side, clipped to the page.
pub fn expand_zone(zone: Region, factor: f64, page_width: u32, page_height: u32) -> Option<Region> {
    let dx = (zone.width as f64 * factor) as u32;
    let dy = (zone.height as f64 * factor) as u32;
    let x0 = zone.x.saturating_sub(dx);
    let y0 = zone.y.saturating_sub(dy);
    let x1 = zone.right().saturating_add(dx).min(page_width);
    let y1 = zone.bottom().saturating_add(dy).min(page_height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Region::new(x0, y0, x1 - x0, y1 - y0))
}

/// Ask `detector` for a zone and post-process it: drop low-confidence
/// detections, then expand and clip.
pub fn locate_zone(
    detector: &dyn ZoneDetector,
    page: &DynamicImage,
    cfg: &ExamConfig,
) -> Option<Region> {
    let found = detector.detect(page, cfg)?;
    if found.confidence < cfg.zone_confidence {
        debug!(
            confidence = found.confidence,
            threshold = cfg.zone_confidence,
            "Zone detection below confidence threshold"
        );
        return None;
    }
    expand_zone(
        found.region,
        cfg.zone_expansion_factor,
        page.width(),
        page.height(),
    )
}
