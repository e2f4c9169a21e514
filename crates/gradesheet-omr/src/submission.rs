// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission grader: grades every page of one submission, in parallel when
// it pays off, then numbers questions in a single sequential pass.
//
// Page tasks never see question numbers. Numbering runs after all pages are
// back, ordered by page index, so worker completion order cannot leave gaps
// or reorder questions. Validation and grading only ever see the merged list.

use gradesheet_core::{ExamConfig, Grade, GradingResult, QuestionResult, ValidationReport};
use image::DynamicImage;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::debug_dump::DebugDumper;
use crate::grading::grade_exam;
use crate::page::{PageOutcome, process_page};
use crate::validation::validate_detection_results;
use crate::zone::ZoneDetector;

/// Everything produced for one submission.
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub results: Vec<QuestionResult>,
    pub validation: ValidationReport,
    pub grading: GradingResult,
    /// Per-page outcomes in page order.
    pub pages: Vec<PageOutcome>,
}

/// Number questions 1..=n across pages, in page-index order.
pub fn assign_question_numbers(mut pages: Vec<(usize, Vec<Grade>)>) -> Vec<QuestionResult> {
    pages.sort_by_key(|(index, _)| *index);
    pages
        .into_iter()
        .flat_map(|(_, grades)| grades)
        .zip(1u32..)
        .map(|(grade, question)| QuestionResult { question, grade })
        .collect()
}

pub struct SubmissionGrader<'a> {
    cfg: &'a ExamConfig,
    detector: &'a dyn ZoneDetector,
    dumper: Option<DebugDumper>,
}

impl<'a> SubmissionGrader<'a> {
    pub fn new(cfg: &'a ExamConfig, detector: &'a dyn ZoneDetector) -> Self {
        Self {
            cfg,
            detector,
            dumper: DebugDumper::from_config(cfg),
        }
    }

    /// Grade `pages` (first page first).
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn grade_pages(&self, pages: &[DynamicImage]) -> GradedSubmission {
        let mut outcomes = if self.cfg.parallel.should_use_parallel(pages.len()) {
            self.process_parallel(pages)
        } else {
            self.process_sequential(pages)
        };
        outcomes.sort_by_key(|o| o.page_index);

        for outcome in &outcomes {
            if let Some(note) = outcome.status.annotation() {
                warn!(page = outcome.page_index + 1, note, "Page contributed no answers");
            }
        }

        let results = assign_question_numbers(
            outcomes
                .iter()
                .map(|o| (o.page_index, o.grades.clone()))
                .collect(),
        );
        let validation = validate_detection_results(&results);
        let grading = grade_exam(&results, self.cfg);
        info!(
            questions = results.len(),
            answered = validation.answered_questions,
            score = grading.score,
            letter = %grading.letter,
            "Submission graded"
        );

        GradedSubmission {
            results,
            validation,
            grading,
            pages: outcomes,
        }
    }

    fn process_one(&self, index: usize, page: &DynamicImage) -> PageOutcome {
        process_page(index, page, self.cfg, self.detector, self.dumper.as_ref())
    }

    fn process_sequential(&self, pages: &[DynamicImage]) -> Vec<PageOutcome> {
        pages
            .iter()
            .enumerate()
            .map(|(index, page)| self.process_one(index, page))
            .collect()
    }

    fn process_parallel(&self, pages: &[DynamicImage]) -> Vec<PageOutcome> {
        let run = || -> Vec<PageOutcome> {
            pages
                .par_iter()
                .enumerate()
                .map(|(index, page)| self.process_one(index, page))
                .collect()
        };

        match self.cfg.parallel.max_threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(run),
                Err(err) => {
                    warn!(threads, %err, "Cannot build page pool, using the global pool");
                    run()
                }
            },
            None => run(),
        }
    }
}
