// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// gradesheet-omr: Checkbox detection and grading engine.
//
// Locates checkbox-sized shapes on a page region, groups them into rows of
// `options_per_question` candidates, scores each candidate as marked or not,
// resolves each row to a grade label, and turns the merged answer list into a
// validation report and a score.

pub mod classify;
pub mod debug_dump;
pub mod grading;
pub mod page;
pub mod resolve;
pub mod rows;
pub mod shapes;
pub mod submission;
pub mod validation;
pub mod visualize;
pub mod zone;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::{CheckboxClassifier, Classification};
pub use grading::{grade_exam, label_weight};
pub use page::{PageOutcome, PageStatus, process_page};
pub use resolve::pick_grade;
pub use rows::{Row, group_rows};
pub use shapes::find_candidates;
pub use submission::{GradedSubmission, SubmissionGrader, assign_question_numbers};
pub use validation::validate_detection_results;
pub use zone::{DetectedZone, FixedZoneDetector, NullZoneDetector, ZoneDetector};
