// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plausibility checks over a merged answer list. Warnings are advisory.

use std::collections::HashMap;

use gradesheet_core::{Grade, QuestionResult, ValidationReport};

/// Fraction of missing answers above which a warning is raised.
pub const MAX_MISSING_RATIO: f64 = 0.30;

/// More than this many identical answers is suspicious.
pub const MIN_QUESTIONS_FOR_UNIFORMITY_CHECK: usize = 5;

pub const NO_QUESTIONS_WARNING: &str = "No questions detected.";
pub const SAME_ANSWER_WARNING: &str = "All questions have same answer: possible detection issue.";

pub fn validate_detection_results(results: &[QuestionResult]) -> ValidationReport {
    let mut report = ValidationReport {
        total_questions: results.len(),
        answered_questions: results.iter().filter(|r| !r.grade.is_missing()).count(),
        warnings: Vec::new(),
    };

    if results.is_empty() {
        report.warnings.push(NO_QUESTIONS_WARNING.to_string());
        return report;
    }

    let mut counts: HashMap<&Grade, usize> = HashMap::new();
    for r in results {
        *counts.entry(&r.grade).or_default() += 1;
    }

    if counts.len() == 1 && results.len() > MIN_QUESTIONS_FOR_UNIFORMITY_CHECK {
        report.warnings.push(SAME_ANSWER_WARNING.to_string());
    }

    let missing = counts.get(&Grade::Missing).copied().unwrap_or(0);
    let missing_ratio = missing as f64 / results.len() as f64;
    if missing_ratio > MAX_MISSING_RATIO {
        report
            .warnings
            .push(format!("High missing rate: {:.1}%", missing_ratio * 100.0));
    }

    report
}
