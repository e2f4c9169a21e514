// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document pipeline: one submitted document in, one persisted summary out.
//
//   rasterize -> identity from page 1 -> grade all pages -> write
//   `<stem>_page_{n}_vis.png` files -> write `<stem>_grades.json`

use std::path::{Path, PathBuf};

use gradesheet_core::error::Result;
use gradesheet_core::{ExamConfig, SubmissionSummary};
use gradesheet_document::Rasterizer;
use gradesheet_omr::{SubmissionGrader, ZoneDetector};
use gradesheet_security::{IdentityCodec, QrScanner, decode_identity};
use tracing::{info, instrument, warn};

/// Everything the pipeline needs, borrowed for the length of a batch.
pub struct Pipeline<'a> {
    pub cfg: &'a ExamConfig,
    pub rasterizer: &'a dyn Rasterizer,
    pub detector: &'a dyn ZoneDetector,
    pub scanner: &'a dyn QrScanner,
    pub codec: &'a IdentityCodec,
    /// Where outputs go; `None` writes next to each document.
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct DocumentReport {
    pub summary: SubmissionSummary,
    pub summary_path: PathBuf,
}

impl Pipeline<'_> {
    /// Grade one document and persist its summary.
    #[instrument(skip(self), fields(document = %document.display()))]
    pub fn grade_document(&self, document: &Path) -> Result<DocumentReport> {
        let pages = self.rasterizer.convert(document)?;

        // Rasterizers never return an empty list, so page 1 exists.
        let student = match pages.first() {
            Some(first) => decode_identity(first, self.cfg, self.scanner, self.codec),
            None => gradesheet_core::StudentRecord::unknown("document has no pages"),
        };

        let graded = SubmissionGrader::new(self.cfg, self.detector).grade_pages(&pages);

        let out_dir = self.output_dir(document);
        std::fs::create_dir_all(&out_dir)?;

        let mut visualizations = Vec::new();
        for outcome in &graded.pages {
            let Some(vis) = &outcome.visualization else {
                continue;
            };
            let path = visualization_path(&out_dir, document, outcome.page_index + 1);
            match vis.save(&path) {
                Ok(()) => visualizations.push(path.display().to_string()),
                Err(err) => warn!(path = %path.display(), %err, "Visualization not written"),
            }
        }

        let summary = SubmissionSummary {
            student,
            total_questions: graded.results.len(),
            results: graded.results,
            validation: graded.validation,
            grading: graded.grading,
            visualizations,
        };

        let summary_path = summary_path(&out_dir, document);
        write_summary(&summary_path, &summary)?;
        info!(
            path = %summary_path.display(),
            score = summary.grading.score,
            letter = %summary.grading.letter,
            "Summary written"
        );

        Ok(DocumentReport {
            summary,
            summary_path,
        })
    }

    fn output_dir(&self, document: &Path) -> PathBuf {
        match &self.out_dir {
            Some(dir) => dir.clone(),
            None => document
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        }
    }
}

fn stem(document: &Path) -> String {
    document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

pub fn summary_path(out_dir: &Path, document: &Path) -> PathBuf {
    out_dir.join(format!("{}_grades.json", stem(document)))
}

/// `page_number` is 1-based.
pub fn visualization_path(out_dir: &Path, document: &Path, page_number: usize) -> PathBuf {
    out_dir.join(format!("{}_page_{}_vis.png", stem(document), page_number))
}

pub fn write_summary(path: &Path, summary: &SubmissionSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}
