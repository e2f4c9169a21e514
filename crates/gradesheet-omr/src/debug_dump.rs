// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Debug artifact dump: writes the classifier's intermediate images to disk
// for the first rows of each page. Diagnostic only: failures are logged and
// swallowed.

use std::path::{Path, PathBuf};

use gradesheet_core::{ExamConfig, Region};
use tracing::{debug, warn};

use crate::classify::Stage;

#[derive(Debug, Clone)]
pub struct DebugDumper {
    dir: PathBuf,
    max_rows: usize,
}

impl DebugDumper {
    pub fn new(dir: impl Into<PathBuf>, max_rows: usize) -> Self {
        Self {
            dir: dir.into(),
            max_rows,
        }
    }

    /// A dumper when `debug_cv` is on and a `debug_dir` is configured.
    pub fn from_config(cfg: &ExamConfig) -> Option<Self> {
        match (&cfg.debug_dir, cfg.debug_cv) {
            (Some(dir), true) => Some(Self::new(dir, cfg.debug_dump_n)),
            _ => None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the 0-based `row` of a page is dumped.
    pub fn wants(&self, row: usize) -> bool {
        row < self.max_rows
    }

    /// Write one PNG per stage for a candidate. `page` and `row` are 0-based
    /// and written 1-based.
    pub fn dump(&self, page: usize, row: usize, label: &str, region: Region, stages: &[Stage]) {
        if let Err(err) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), %err, "Cannot create debug directory");
            return;
        }
        for stage in stages {
            let path = self.dir.join(file_name(page, row, label, region, stage.name));
            match stage.image.save(&path) {
                Ok(()) => debug!(path = %path.display(), "Debug stage written"),
                Err(err) => warn!(path = %path.display(), %err, "Debug stage not written"),
            }
        }
    }
}

fn file_name(page: usize, row: usize, label: &str, region: Region, stage: &str) -> String {
    format!("p{:02}_r{:02}_{}_{}_{}.png", page + 1, row + 1, label, region, stage)
}
