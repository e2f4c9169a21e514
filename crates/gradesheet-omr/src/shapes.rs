// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate shape finder: locates checkbox-sized squares and circles in a
// page region.

use gradesheet_core::Region;
use gradesheet_core::config::ShapeFilter;
use gradesheet_document::scan::otsu_ink;
use image::GrayImage;
use imageproc::contours::{Contour, find_contours};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::{debug, instrument};

/// Light blur applied before binarization; equivalent to a 3x3 Gaussian.
pub(crate) const DENOISE_SIGMA: f32 = 0.8;

/// Find candidate checkbox shapes in `region`.
///
/// Every contour (outer borders and holes alike) is considered. A contour is
/// kept when its bounding box is within `[min_size, max_size]` on both axes
/// and it is either a quadrilateral after polygon approximation or round
/// enough. Returned boxes are sorted by `(y, x)` with nested duplicates
/// removed. Coordinates are relative to `region`.
#[instrument(skip_all, fields(width = region.width(), height = region.height()))]
pub fn find_candidates(region: &GrayImage, filter: &ShapeFilter) -> Vec<Region> {
    if region.width() == 0 || region.height() == 0 {
        return Vec::new();
    }

    let blurred = gaussian_blur_f32(region, DENOISE_SIGMA);
    let (_, mask) = otsu_ink(&blurred);
    let contours: Vec<Contour<i32>> = find_contours(&mask);

    let mut boxes: Vec<Region> = contours
        .iter()
        .filter_map(|contour| accept(&contour.points, filter))
        .collect();
    debug!(contours = contours.len(), accepted = boxes.len(), "Contours filtered");

    boxes.sort_by_key(|b| (b.y, b.x));
    let kept = dedup_nested(boxes, filter.dedup_tolerance);
    debug!(candidates = kept.len(), "Candidate shapes found");
    kept
}

/// Bounding box of `points` if the contour passes the size and shape tests.
fn accept(points: &[Point<i32>], filter: &ShapeFilter) -> Option<Region> {
    let bbox = bounding_box(points)?;
    let in_range = |side: u32| (filter.min_size..=filter.max_size).contains(&side);
    if !in_range(bbox.width) || !in_range(bbox.height) {
        return None;
    }

    let perimeter = arc_length(points, true);
    let vertices = if filter.approx_epsilon > 0.0 {
        approximate_polygon_dp(points, filter.approx_epsilon * perimeter, true).len()
    } else {
        points.len()
    };
    let circularity =
        4.0 * std::f64::consts::PI * polygon_area(points) / (perimeter * perimeter + 1e-5);

    (vertices == 4 || circularity > filter.min_circularity).then_some(bbox)
}

fn bounding_box(points: &[Point<i32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Region::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: i64 = (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum();
    twice.abs() as f64 / 2.0
}

/// Drop a box when an already kept box starts within `tolerance` on both
/// axes and has a strictly larger area. Input must be `(y, x)` sorted.
fn dedup_nested(sorted: Vec<Region>, tolerance: u32) -> Vec<Region> {
    let mut kept: Vec<Region> = Vec::with_capacity(sorted.len());
    for candidate in sorted {
        let nested = kept.iter().any(|k| {
            k.x.abs_diff(candidate.x) < tolerance
                && k.y.abs_diff(candidate.y) < tolerance
                && candidate.area() < k.area()
        });
        if !nested {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BOX, COLUMNS, TOP, sheet};
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    #[test]
    fn finds_one_box_per_frame_in_reading_order() {
        let boxes = find_candidates(&sheet(&[None, Some(1)]), &ShapeFilter::default());
        assert_eq!(boxes.len(), 6);
        for (i, b) in boxes.iter().enumerate() {
            let expected_x = COLUMNS[i % 3];
            assert!(b.x.abs_diff(expected_x) <= 1, "box {i}: {b}");
            assert!(b.width.abs_diff(BOX) <= 2, "box {i}: {b}");
        }
        assert!(boxes[0].y.abs_diff(TOP) <= 1);
        assert!(boxes[3].y > boxes[0].y);
    }

    #[test]
    fn size_filter_rejects_specks_and_frames() {
        let mut img = GrayImage::from_pixel(200, 200, Luma([255u8]));
        // Too small.
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(6, 6), Luma([0]));
        // Too large.
        draw_filled_rect_mut(&mut img, Rect::at(60, 60).of_size(100, 100), Luma([0]));
        assert!(find_candidates(&img, &ShapeFilter::default()).is_empty());
    }

    #[test]
    fn round_glyphs_are_accepted() {
        let mut img = GrayImage::from_pixel(100, 100, Luma([255u8]));
        draw_filled_circle_mut(&mut img, (50, 50), 12, Luma([0]));
        let boxes = find_candidates(&img, &ShapeFilter::default());
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn blank_region_yields_nothing() {
        let img = GrayImage::from_pixel(80, 80, Luma([250u8]));
        assert!(find_candidates(&img, &ShapeFilter::default()).is_empty());
        assert!(find_candidates(&GrayImage::new(0, 0), &ShapeFilter::default()).is_empty());
    }

    #[test]
    fn nested_smaller_box_is_dropped() {
        let boxes = vec![Region::new(10, 10, 30, 30), Region::new(12, 12, 26, 26)];
        assert_eq!(dedup_nested(boxes, 5), vec![Region::new(10, 10, 30, 30)]);
    }

    #[test]
    fn distant_boxes_both_survive_dedup() {
        let boxes = vec![Region::new(10, 10, 30, 30), Region::new(60, 10, 20, 20)];
        assert_eq!(dedup_nested(boxes, 5).len(), 2);
    }

    #[test]
    fn shoelace_area_of_square() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
    }
}
