// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row resolver: one grade per row.
//
// The candidate with the highest score wins, checked or not; its label is
// reported only if that candidate was classified as checked. A row whose
// best candidate is a faint unchecked mark is therefore `missing`, even when
// a lower-scoring candidate was checked.

use gradesheet_core::{Grade, Region};
use image::DynamicImage;
use tracing::debug;

use crate::classify::{CheckboxClassifier, Classification};
use crate::debug_dump::DebugDumper;
use crate::rows::Row;

/// A resolved row with the per-candidate evidence behind it.
#[derive(Debug, Clone)]
pub struct ResolvedRow {
    pub grade: Grade,
    pub candidates: Vec<(Region, Classification)>,
}

/// Pick the grade for a row from its classifications, in option order.
///
/// Ties go to the earliest option.
pub fn pick_grade(classifications: &[Classification], labels: &[String]) -> Grade {
    let mut best: Option<(usize, &Classification)> = None;
    for (index, c) in classifications.iter().enumerate() {
        if best.is_none_or(|(_, b)| c.score > b.score) {
            best = Some((index, c));
        }
    }

    match best {
        Some((index, c)) if c.checked => labels
            .get(index)
            .map_or(Grade::Missing, |label| Grade::Label(label.clone())),
        _ => Grade::Missing,
    }
}

pub struct RowResolver<'a> {
    classifier: &'a CheckboxClassifier,
    labels: &'a [String],
    dumper: Option<&'a DebugDumper>,
}

impl<'a> RowResolver<'a> {
    pub fn new(
        classifier: &'a CheckboxClassifier,
        labels: &'a [String],
        dumper: Option<&'a DebugDumper>,
    ) -> Self {
        Self {
            classifier,
            labels,
            dumper,
        }
    }

    /// Classify every candidate of `row` (coordinates relative to `zone`)
    /// and resolve the row. `page` and `row_index` are 0-based.
    pub fn resolve(&self, zone: &DynamicImage, page: usize, row_index: usize, row: &Row) -> ResolvedRow {
        let dump = self.dumper.filter(|d| d.wants(row_index));

        let candidates: Vec<(Region, Classification)> = row
            .iter()
            .zip(self.labels)
            .map(|(&region, label)| {
                let roi = crop(zone, region);
                let classification = match dump {
                    Some(dumper) => {
                        let (c, stages) = self.classifier.classify_traced(&roi);
                        dumper.dump(page, row_index, label, region, &stages);
                        c
                    }
                    None => self.classifier.classify(&roi),
                };
                debug!(
                    page = page + 1,
                    row = row_index + 1,
                    label = %label,
                    width = classification.width,
                    height = classification.height,
                    inner_ratio = classification.inner_ratio,
                    edge_ratio = classification.edge_ratio,
                    score = classification.score,
                    checked = classification.checked,
                    "Candidate classified"
                );
                (region, classification)
            })
            .collect();

        let scores: Vec<Classification> = candidates.iter().map(|(_, c)| *c).collect();
        ResolvedRow {
            grade: pick_grade(&scores, self.labels),
            candidates,
        }
    }
}

/// Copy of `region` out of `zone`, clipped; empty when fully outside.
fn crop(zone: &DynamicImage, region: Region) -> DynamicImage {
    match region.clamp_to(zone.width(), zone.height()) {
        Some(r) => zone.crop_imm(r.x, r.y, r.width, r.height),
        None => DynamicImage::new_luma8(0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BOX, COLUMNS, TOP, sheet_page};
    use gradesheet_core::ExamConfig;

    fn scored(checked: bool, score: f64) -> Classification {
        Classification {
            checked,
            score,
            inner_ratio: score,
            edge_ratio: 0.0,
            width: 30,
            height: 30,
            pad: 5,
            empty_region: false,
        }
    }

    fn labels() -> Vec<String> {
        ExamConfig::default().option_labels
    }

    #[test]
    fn higher_unchecked_score_beats_lower_checked() {
        let grade = pick_grade(&[scored(true, 0.9), scored(false, 0.95)], &labels());
        assert_eq!(grade, Grade::Missing);
    }

    #[test]
    fn best_checked_candidate_gives_its_label() {
        let grade = pick_grade(
            &[scored(false, 0.01), scored(true, 0.4), scored(true, 0.2)],
            &labels(),
        );
        assert_eq!(grade, Grade::Label("moyen".into()));
    }

    #[test]
    fn ties_keep_the_first_option() {
        let grade = pick_grade(&[scored(true, 0.5), scored(true, 0.5)], &labels());
        assert_eq!(grade, Grade::Label("bon".into()));
    }

    #[test]
    fn empty_row_is_missing() {
        assert_eq!(pick_grade(&[], &labels()), Grade::Missing);
    }

    #[test]
    fn resolves_marked_middle_option_on_a_sheet() {
        let cfg = ExamConfig::default();
        let classifier = CheckboxClassifier::from_config(&cfg);
        let labels = cfg.effective_labels();
        let resolver = RowResolver::new(&classifier, &labels, None);

        let row: Row = COLUMNS.iter().map(|&x| Region::new(x, TOP, BOX, BOX)).collect();
        let resolved = resolver.resolve(&sheet_page(&[Some(1)]), 0, 0, &row);
        assert_eq!(resolved.grade, Grade::Label(labels[1].clone()));
        assert_eq!(resolved.candidates.len(), 3);
    }

    #[test]
    fn out_of_bounds_candidate_is_unchecked() {
        let page = sheet_page(&[None]);
        let roi = crop(&page, Region::new(5000, 5000, 30, 30));
        assert_eq!((roi.width(), roi.height()), (0, 0));
    }
}
