// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row grouper: partitions candidate shapes into fixed-size, axis-ordered
// rows, one row per question.

use gradesheet_core::Region;
use gradesheet_core::config::RowStrategy;
use tracing::debug;

/// Exactly `options_per_question` candidates, in option order.
pub type Row = Vec<Region>;

/// Group `candidates` (sorted by `(y, x)`) into rows of `n`.
///
/// Groups that cannot be filled to `n` are discarded, never padded.
pub fn group_rows(candidates: &[Region], n: usize, strategy: RowStrategy) -> Vec<Row> {
    if n == 0 {
        return Vec::new();
    }
    let rows = match strategy {
        RowStrategy::Chunked => chunked(candidates, n),
        RowStrategy::Proximity => proximity(candidates, n),
    };
    debug!(
        candidates = candidates.len(),
        rows = rows.len(),
        ?strategy,
        "Candidates grouped into rows"
    );
    rows
}

/// Consecutive chunks of `n` in input order; each chunk is sorted along its
/// dominant axis of variation.
fn chunked(candidates: &[Region], n: usize) -> Vec<Row> {
    candidates
        .chunks_exact(n)
        .map(|chunk| {
            let mut row = chunk.to_vec();
            order_along_dominant_axis(&mut row);
            row
        })
        .collect()
}

/// Cluster candidates into lines by centre distance across the line, then
/// cut each line into rows of `n` along it.
///
/// Both horizontal lines and vertical columns are tried; the layout that
/// yields more complete rows wins, horizontal on a tie.
fn proximity(candidates: &[Region], n: usize) -> Vec<Row> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let horizontal = lines_along(candidates, n, Axis::Horizontal);
    let vertical = lines_along(candidates, n, Axis::Vertical);
    if vertical.len() > horizontal.len() {
        vertical
    } else {
        horizontal
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    /// Options laid out left-to-right.
    Horizontal,
    /// Options laid out top-to-bottom.
    Vertical,
}

impl Axis {
    /// Centre across the line.
    fn cross_centre(self, c: &Region) -> f64 {
        match self {
            Self::Horizontal => c.y as f64 + c.height as f64 / 2.0,
            Self::Vertical => c.x as f64 + c.width as f64 / 2.0,
        }
    }

    fn cross_extent(self, c: &Region) -> u32 {
        match self {
            Self::Horizontal => c.height,
            Self::Vertical => c.width,
        }
    }

    /// Position along the line.
    fn along(self, c: &Region) -> u32 {
        match self {
            Self::Horizontal => c.x,
            Self::Vertical => c.y,
        }
    }
}

fn lines_along(candidates: &[Region], n: usize, axis: Axis) -> Vec<Row> {
    let mut extents: Vec<u32> = candidates.iter().map(|c| axis.cross_extent(c)).collect();
    extents.sort_unstable();
    let tolerance = extents[extents.len() / 2] as f64 / 2.0;

    let mut ordered: Vec<Region> = candidates.to_vec();
    ordered.sort_by(|a, b| axis.cross_centre(a).total_cmp(&axis.cross_centre(b)));

    let mut lines: Vec<Vec<Region>> = Vec::new();
    for candidate in ordered {
        match lines.last_mut() {
            Some(line) if axis.cross_centre(&candidate) - line_centre(line, axis) <= tolerance => {
                line.push(candidate)
            }
            _ => lines.push(vec![candidate]),
        }
    }

    lines
        .into_iter()
        .flat_map(|mut line| {
            line.sort_by_key(|c| axis.along(c));
            line.chunks_exact(n).map(<[Region]>::to_vec).collect::<Vec<_>>()
        })
        .collect()
}

fn order_along_dominant_axis(row: &mut [Region]) {
    let xs: Vec<f64> = row.iter().map(|c| c.x as f64).collect();
    let ys: Vec<f64> = row.iter().map(|c| c.y as f64).collect();
    if std_dev(&xs) > std_dev(&ys) {
        row.sort_by_key(|c| c.x);
    } else {
        row.sort_by_key(|c| c.y);
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn line_centre(line: &[Region], axis: Axis) -> f64 {
    line.iter().map(|c| axis.cross_centre(c)).sum::<f64>() / line.len() as f64
}
