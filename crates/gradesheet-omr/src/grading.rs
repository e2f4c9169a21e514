// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grading: turns a merged answer list into a percentage and a letter.

use gradesheet_core::config::LabelOrder;
use gradesheet_core::{ExamConfig, Grade, GradingResult, Letter, QuestionResult};
use tracing::debug;

/// Credit for the label at `index` out of `len` labels.
///
/// `BestFirst` gives index 0 full credit and the last label none;
/// `WorstFirst` is the reverse. A single-label scale always gives full
/// credit.
pub fn label_weight(index: usize, len: usize, order: LabelOrder) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    let top = (len - 1) as f64;
    match order {
        LabelOrder::BestFirst => (top - index as f64) / top,
        LabelOrder::WorstFirst => index as f64 / top,
    }
}

/// Score `results` out of 100, rounded to two decimals.
///
/// Each question is worth `100 / total`, scaled by the weight of its label.
/// Missing answers and labels outside the effective label set earn nothing.
pub fn grade_exam(results: &[QuestionResult], cfg: &ExamConfig) -> GradingResult {
    if results.is_empty() {
        return GradingResult {
            score: 0.0,
            letter: Letter::F,
        };
    }

    let labels = cfg.effective_labels();
    let points_per_question = 100.0 / results.len() as f64;

    let raw: f64 = results
        .iter()
        .map(|r| match &r.grade {
            Grade::Label(label) => labels
                .iter()
                .position(|l| l == label)
                .map_or(0.0, |i| label_weight(i, labels.len(), cfg.label_order)),
            Grade::Missing => 0.0,
        })
        .map(|weight| weight * points_per_question)
        .sum();

    let score = (raw * 100.0).round() / 100.0;
    let letter = Letter::from_score(score);
    debug!(score, %letter, questions = results.len(), "Exam graded");
    GradingResult { score, letter }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(grades: &[&str]) -> Vec<QuestionResult> {
        grades
            .iter()
            .enumerate()
            .map(|(i, g)| QuestionResult {
                question: i as u32 + 1,
                grade: Grade::from(*g),
            })
            .collect()
    }

    #[test]
    fn empty_exam_is_zero_f() {
        let result = grade_exam(&[], &ExamConfig::default());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.letter, Letter::F);
    }

    #[test]
    fn weights_span_zero_to_one() {
        assert_eq!(label_weight(0, 3, LabelOrder::BestFirst), 1.0);
        assert_eq!(label_weight(1, 3, LabelOrder::BestFirst), 0.5);
        assert_eq!(label_weight(2, 3, LabelOrder::BestFirst), 0.0);
        assert_eq!(label_weight(0, 3, LabelOrder::WorstFirst), 0.0);
        assert_eq!(label_weight(2, 3, LabelOrder::WorstFirst), 1.0);
    }

    #[test]
    fn single_label_scale_gives_full_credit() {
        assert_eq!(label_weight(0, 1, LabelOrder::BestFirst), 1.0);
        assert_eq!(label_weight(0, 1, LabelOrder::WorstFirst), 1.0);

        let cfg = ExamConfig {
            options_per_question: 1,
            option_labels: vec!["yes".into()],
            ..ExamConfig::default()
        };
        assert_eq!(grade_exam(&answers(&["yes", "missing"]), &cfg).score, 50.0);
    }

    #[test]
    fn all_best_answers_score_a() {
        let result = grade_exam(&answers(&["bon"; 6]), &ExamConfig::default());
        assert_eq!(result.score, 100.0);
        assert_eq!(result.letter, Letter::A);
    }

    #[test]
    fn worst_first_reverses_the_scale() {
        let cfg = ExamConfig {
            label_order: LabelOrder::WorstFirst,
            ..ExamConfig::default()
        };
        assert_eq!(grade_exam(&answers(&["non"; 4]), &cfg).score, 100.0);
        assert_eq!(grade_exam(&answers(&["bon"; 4]), &cfg).score, 0.0);
    }

    #[test]
    fn mixed_answers_round_to_two_decimals() {
        // (1 + 0.5 + 0) / 3 * 100 = 50.0 ; one extra missing -> 37.5
        let cfg = ExamConfig::default();
        assert_eq!(grade_exam(&answers(&["bon", "moyen", "non"]), &cfg).score, 50.0);
        let result = grade_exam(&answers(&["bon", "moyen", "non", "missing"]), &cfg);
        assert_eq!(result.score, 37.5);
        assert_eq!(result.letter, Letter::F);

        // 2/3 * 100 = 66.666.. -> 66.67
        let result = grade_exam(&answers(&["bon", "bon", "non"]), &cfg);
        assert_eq!(result.score, 66.67);
        assert_eq!(result.letter, Letter::D);
    }

    #[test]
    fn mismatched_labels_grade_against_synthetic_set() {
        let cfg = ExamConfig {
            options_per_question: 2,
            ..ExamConfig::default()
        };
        // Configured labels no longer apply; opt_0 is the best of two.
        assert_eq!(grade_exam(&answers(&["bon", "opt_0"]), &cfg).score, 50.0);
    }
}
