// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic answer sheets for unit tests.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const BOX: u32 = 30;
pub const STROKE: u32 = 2;
pub const COLUMNS: [u32; 3] = [20, 70, 120];
pub const ROW_PITCH: u32 = 50;
pub const TOP: u32 = 20;

const PAPER: Luma<u8> = Luma([255]);
const PEN: Luma<u8> = Luma([0]);

/// Draw an empty square checkbox frame.
pub fn draw_frame(img: &mut GrayImage, x: u32, y: u32) {
    let outer = Rect::at(x as i32, y as i32).of_size(BOX, BOX);
    let inner = Rect::at((x + STROKE) as i32, (y + STROKE) as i32)
        .of_size(BOX - 2 * STROKE, BOX - 2 * STROKE);
    draw_filled_rect_mut(img, outer, PEN);
    draw_filled_rect_mut(img, inner, PAPER);
}

/// Fill a 10x10 block at the centre of the frame at `(x, y)`.
pub fn mark(img: &mut GrayImage, x: u32, y: u32) {
    draw_filled_rect_mut(img, Rect::at(x as i32 + 10, y as i32 + 10).of_size(10, 10), PEN);
}

/// A sheet with one 3-option row per entry; `Some(i)` marks option `i`.
pub fn sheet(rows: &[Option<usize>]) -> GrayImage {
    let height = TOP + rows.len() as u32 * ROW_PITCH + 10;
    let mut img = GrayImage::from_pixel(170, height, PAPER);
    for (r, marked) in rows.iter().enumerate() {
        let y = TOP + r as u32 * ROW_PITCH;
        for (c, &x) in COLUMNS.iter().enumerate() {
            draw_frame(&mut img, x, y);
            if *marked == Some(c) {
                mark(&mut img, x, y);
            }
        }
    }
    img
}

pub fn sheet_page(rows: &[Option<usize>]) -> DynamicImage {
    DynamicImage::ImageLuma8(sheet(rows))
}

/// A single checkbox crop: frame plus optional mark.
pub fn checkbox(marked: bool) -> GrayImage {
    let mut img = GrayImage::from_pixel(BOX, BOX, PAPER);
    draw_frame(&mut img, 0, 0);
    if marked {
        mark(&mut img, 0, 0);
    }
    img
}
