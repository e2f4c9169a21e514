// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page visualization: outlines the zone and every classified candidate.

use gradesheet_core::Region;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

pub const ZONE_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);
pub const CHECKED_COLOUR: Rgb<u8> = Rgb([0, 200, 0]);
pub const UNCHECKED_COLOUR: Rgb<u8> = Rgb([220, 0, 0]);

/// Draw `zone` and the `(box, checked)` candidates onto an RGB copy of
/// `page`. All boxes are in page coordinates.
pub fn render(page: &DynamicImage, zone: Option<Region>, candidates: &[(Region, bool)]) -> RgbImage {
    let mut canvas = page.to_rgb8();
    if let Some(zone) = zone {
        outline(&mut canvas, zone, ZONE_COLOUR);
    }
    for &(region, checked) in candidates {
        let colour = if checked {
            CHECKED_COLOUR
        } else {
            UNCHECKED_COLOUR
        };
        outline(&mut canvas, region, colour);
    }
    canvas
}

fn outline(canvas: &mut RgbImage, region: Region, colour: Rgb<u8>) {
    if region.is_empty() {
        return;
    }
    let rect = Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height);
    draw_hollow_rect_mut(canvas, rect, colour);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlines_use_state_colours() {
        let page = DynamicImage::new_luma8(100, 60);
        let canvas = render(
            &page,
            Some(Region::new(0, 0, 100, 60)),
            &[
                (Region::new(10, 10, 20, 20), true),
                (Region::new(50, 10, 20, 20), false),
                (Region::new(80, 10, 0, 20), true),
            ],
        );
        assert_eq!(canvas.dimensions(), (100, 60));
        assert_eq!(*canvas.get_pixel(0, 30), ZONE_COLOUR);
        assert_eq!(*canvas.get_pixel(10, 15), CHECKED_COLOUR);
        assert_eq!(*canvas.get_pixel(69, 15), UNCHECKED_COLOUR);
        assert_eq!(*canvas.get_pixel(20, 20), Rgb([0, 0, 0]));
    }
}
