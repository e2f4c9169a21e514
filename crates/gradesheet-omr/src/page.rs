// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page orchestrator: runs one page through
// deskew -> zone detection -> shape finding -> grouping -> resolution.
//
// Detection problems are page-scoped: a page that yields nothing reports why
// in its `PageStatus` and contributes no answers. Nothing here returns an
// error.

use std::borrow::Cow;

use gradesheet_core::{ExamConfig, Grade, QuestionResult, Region, ValidationReport};
use gradesheet_document::scan::deskew;
use image::{DynamicImage, RgbImage};
use tracing::{info, instrument, warn};

use crate::classify::CheckboxClassifier;
use crate::debug_dump::DebugDumper;
use crate::resolve::RowResolver;
use crate::rows::group_rows;
use crate::shapes::find_candidates;
use crate::validation::validate_detection_results;
use crate::visualize;
use crate::zone::{ZoneDetector, locate_zone};

/// Pipeline stage a page stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStage {
    ShapeFind,
    Grouping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Graded,
    /// Zone detection found nothing and full-page fallback is off.
    Skipped { reason: String },
    Failed { stage: PageStage, reason: String },
}

impl PageStatus {
    /// Human-readable annotation for non-graded pages.
    pub fn annotation(&self) -> Option<&str> {
        match self {
            Self::Graded => None,
            Self::Skipped { reason } | Self::Failed { reason, .. } => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageOutcome {
    /// 0-based position of the page in its submission.
    pub page_index: usize,
    /// One grade per resolved row, in row order.
    pub grades: Vec<Grade>,
    pub status: PageStatus,
    /// Page-local report (questions numbered from 1 within the page).
    pub validation: ValidationReport,
    /// Zone used for processing, in page coordinates; `None` = full page.
    pub zone: Option<Region>,
    pub visualization: Option<RgbImage>,
}

impl PageOutcome {
    /// A page that produced no answers. Its visualization, when enabled, is
    /// the page with only the zone outlined.
    fn stopped(
        page_index: usize,
        status: PageStatus,
        zone: Option<Region>,
        page: &DynamicImage,
        cfg: &ExamConfig,
    ) -> Self {
        Self {
            page_index,
            grades: Vec::new(),
            status,
            validation: validate_detection_results(&[]),
            zone,
            visualization: cfg
                .save_visualizations
                .then(|| visualize::render(page, zone, &[])),
        }
    }
}

/// Grade one page. `page_index` is 0-based.
#[instrument(skip_all, fields(page_number = page_index + 1))]
pub fn process_page(
    page_index: usize,
    page: &DynamicImage,
    cfg: &ExamConfig,
    detector: &dyn ZoneDetector,
    dumper: Option<&DebugDumper>,
) -> PageOutcome {
    let page: Cow<'_, DynamicImage> = if cfg.enable_deskew {
        Cow::Owned(deskew(page.clone()))
    } else {
        Cow::Borrowed(page)
    };

    let zone = if cfg.use_zone_detection && detector.is_available() {
        match locate_zone(detector, &page, cfg) {
            Some(zone) => {
                info!(%zone, "Using detected zone");
                Some(zone)
            }
            None if cfg.fallback_to_full_page => {
                warn!("No zone detected, falling back to the full page");
                None
            }
            None => {
                warn!("No zone detected, skipping page");
                return PageOutcome::stopped(
                    page_index,
                    PageStatus::Skipped {
                        reason: "Page skipped (no zone detected)".to_string(),
                    },
                    None,
                    &page,
                    cfg,
                );
            }
        }
    } else {
        None
    };

    let area: Cow<'_, DynamicImage> = match zone {
        Some(z) => Cow::Owned(page.crop_imm(z.x, z.y, z.width, z.height)),
        None => Cow::Borrowed(&*page),
    };

    let candidates = find_candidates(&area.to_luma8(), &cfg.shapes);
    if candidates.is_empty() {
        warn!("No checkbox candidates found");
        return PageOutcome::stopped(
            page_index,
            PageStatus::Failed {
                stage: PageStage::ShapeFind,
                reason: "No checkbox candidates found in processing area".to_string(),
            },
            zone,
            &page,
            cfg,
        );
    }

    let rows = group_rows(&candidates, cfg.options_per_question, cfg.rows.strategy);
    if rows.is_empty() {
        warn!(candidates = candidates.len(), "No complete checkbox rows");
        return PageOutcome::stopped(
            page_index,
            PageStatus::Failed {
                stage: PageStage::Grouping,
                reason: "No valid checkbox rows detected".to_string(),
            },
            zone,
            &page,
            cfg,
        );
    }

    let classifier = CheckboxClassifier::from_config(cfg);
    let labels = cfg.effective_labels();
    let resolver = RowResolver::new(&classifier, &labels, dumper);
    let resolved: Vec<_> = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| resolver.resolve(&area, page_index, row_index, row))
        .collect();

    let grades: Vec<Grade> = resolved.iter().map(|r| r.grade.clone()).collect();
    let local: Vec<QuestionResult> = grades
        .iter()
        .zip(1u32..)
        .map(|(grade, question)| QuestionResult {
            question,
            grade: grade.clone(),
        })
        .collect();
    let validation = validate_detection_results(&local);
    info!(
        rows = grades.len(),
        answered = validation.answered_questions,
        "Page graded"
    );

    let visualization = cfg.save_visualizations.then(|| {
        let (dx, dy) = zone.map_or((0, 0), |z| (z.x, z.y));
        let marks: Vec<(Region, bool)> = resolved
            .iter()
            .flat_map(|r| r.candidates.iter())
            .map(|(region, c)| (region.offset(dx, dy), c.checked))
            .collect();
        visualize::render(&page, zone, &marks)
    });

    PageOutcome {
        page_index,
        grades,
        status: PageStatus::Graded,
        validation,
        zone,
        visualization,
    }
}
