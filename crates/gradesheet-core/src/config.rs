// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exam configuration.
//
// Persisted as pretty JSON. Unknown keys are ignored and every field has a
// default, so files written by other versions still load.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{GradesheetError, Result};
use crate::types::{MISSING_GRADE, Region};

/// File name used for the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "exam_config.json";

/// How the configured option labels are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOrder {
    /// `option_labels[0]` is the best answer (weight 1.0).
    #[default]
    BestFirst,
    /// `option_labels[0]` is the worst answer (weight 0.0).
    WorstFirst,
}

/// How candidate shapes are partitioned into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStrategy {
    /// Consume the (y, x)-sorted candidates in chunks of N.
    #[default]
    Chunked,
    /// Cluster candidates into lines by vertical proximity, then chunk each
    /// line left-to-right.
    Proximity,
}

/// Geometric filters for the candidate shape finder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeFilter {
    /// Smallest accepted bounding-box side, in pixels.
    pub min_size: u32,
    /// Largest accepted bounding-box side, in pixels.
    pub max_size: u32,
    /// Two boxes whose origins differ by less than this (both axes) are
    /// treated as the same detection.
    pub dedup_tolerance: u32,
    /// `4·pi·area / perimeter²` above which a contour counts as round.
    pub min_circularity: f64,
    /// Polygon approximation tolerance as a fraction of the perimeter.
    pub approx_epsilon: f64,
}

impl Default for ShapeFilter {
    fn default() -> Self {
        Self {
            min_size: 15,
            max_size: 60,
            dedup_tolerance: 5,
            min_circularity: 0.7,
            approx_epsilon: 0.04,
        }
    }
}

/// Row grouping settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSettings {
    pub strategy: RowStrategy,
}

/// Page-level parallelism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelPolicy {
    /// Worker threads for page processing. `None` uses rayon's global pool.
    pub max_threads: Option<usize>,
    /// Documents with at most this many pages are processed sequentially.
    pub page_threshold: usize,
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            page_threshold: 1,
        }
    }
}

impl ParallelPolicy {
    pub fn should_use_parallel(&self, pages: usize) -> bool {
        pages > self.page_threshold
    }
}

/// Immutable per-run exam settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    /// Number of answer options (checkboxes) per question.
    pub options_per_question: usize,
    /// Option labels in the order the checkboxes appear on the sheet.
    pub option_labels: Vec<String>,
    /// Whether `option_labels` runs best-to-worst or worst-to-best.
    pub label_order: LabelOrder,

    // -- Checkbox classifier --
    /// OR a local-mean threshold into the global Otsu mask.
    pub use_adaptive_threshold: bool,
    /// Fraction of `min(w, h)` trimmed on each side to skip the printed frame.
    pub inner_crop_pct: f64,
    /// Ink ratio that suggests a mark when paired with enough edges.
    pub min_inner_on_ratio: f64,
    /// Ink ratio that alone marks the box as checked.
    pub strong_inner_on_ratio: f64,
    /// Edge density paired with `min_inner_on_ratio`.
    pub edge_density_thr: f64,
    /// Combined score threshold.
    pub min_vote_score: f64,

    // -- Zone detection --
    pub use_zone_detection: bool,
    /// Detections below this confidence are discarded.
    pub zone_confidence: f64,
    /// Detected zones grow by this fraction of their size on every side.
    pub zone_expansion_factor: f64,
    /// Fixed answer-area rectangle for template sheets.
    pub zone_region: Option<Region>,
    /// Process the full page when zone detection finds nothing, instead of
    /// skipping the page.
    pub fallback_to_full_page: bool,

    // -- Preprocessing --
    pub enable_deskew: bool,
    /// Where the identity QR code sits on the first page.
    pub qr_crop_region: Option<Region>,

    pub shapes: ShapeFilter,
    pub rows: RowSettings,
    pub parallel: ParallelPolicy,

    // -- Diagnostics --
    /// Dump intermediate checkbox images.
    pub debug_cv: bool,
    /// Rows per page whose candidates are dumped.
    pub debug_dump_n: usize,
    pub debug_dir: Option<PathBuf>,
    pub save_visualizations: bool,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            options_per_question: 3,
            option_labels: vec!["bon".into(), "moyen".into(), "non".into()],
            label_order: LabelOrder::BestFirst,
            use_adaptive_threshold: true,
            inner_crop_pct: 0.18,
            min_inner_on_ratio: 0.06,
            strong_inner_on_ratio: 0.12,
            edge_density_thr: 0.06,
            min_vote_score: 0.12,
            use_zone_detection: true,
            zone_confidence: 0.5,
            zone_expansion_factor: 0.05,
            zone_region: None,
            fallback_to_full_page: false,
            enable_deskew: false,
            qr_crop_region: Some(Region::new(1363, 78, 217, 217)),
            shapes: ShapeFilter::default(),
            rows: RowSettings::default(),
            parallel: ParallelPolicy::default(),
            debug_cv: false,
            debug_dump_n: 24,
            debug_dir: None,
            save_visualizations: true,
        }
    }
}

impl ExamConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(
            options = config.options_per_question,
            labels = ?config.option_labels,
            "Config loaded"
        );
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.options_per_question == 0 {
            return Err(invalid("options_per_question must be at least 1"));
        }
        let ratios = [
            ("inner_crop_pct", self.inner_crop_pct),
            ("min_inner_on_ratio", self.min_inner_on_ratio),
            ("strong_inner_on_ratio", self.strong_inner_on_ratio),
            ("edge_density_thr", self.edge_density_thr),
            ("min_vote_score", self.min_vote_score),
            ("zone_confidence", self.zone_confidence),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if !self.zone_expansion_factor.is_finite() || self.zone_expansion_factor < 0.0 {
            return Err(invalid(format!(
                "zone_expansion_factor must be >= 0, got {}",
                self.zone_expansion_factor
            )));
        }
        if self.shapes.min_size > self.shapes.max_size {
            return Err(invalid(format!(
                "shapes.min_size ({}) exceeds shapes.max_size ({})",
                self.shapes.min_size, self.shapes.max_size
            )));
        }
        if self.shapes.approx_epsilon <= 0.0 {
            return Err(invalid("shapes.approx_epsilon must be positive"));
        }
        if self.option_labels.iter().any(|l| l == MISSING_GRADE) {
            return Err(invalid(format!("\"{MISSING_GRADE}\" is reserved and cannot be an option label")));
        }
        Ok(())
    }

    /// Labels actually used for resolution and grading: the configured ones,
    /// or `opt_0..opt_{N-1}` when their count does not match
    /// `options_per_question`.
    pub fn effective_labels(&self) -> Cow<'_, [String]> {
        if self.option_labels.len() == self.options_per_question {
            Cow::Borrowed(&self.option_labels)
        } else {
            Cow::Owned(
                (0..self.options_per_question)
                    .map(|i| format!("opt_{i}"))
                    .collect(),
            )
        }
    }
}

fn invalid(msg: impl Into<String>) -> GradesheetError {
    GradesheetError::InvalidConfig(msg.into())
}
