// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the gradesheet-omr engine: scoring a single
// checkbox crop and grading a full synthetic page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use gradesheet_core::ExamConfig;
use gradesheet_omr::{CheckboxClassifier, NullZoneDetector, process_page};

const PAPER: Luma<u8> = Luma([245]);
const PEN: Luma<u8> = Luma([25]);

fn frame(img: &mut GrayImage, x: i32, y: i32, marked: bool) {
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(30, 30), PEN);
    draw_filled_rect_mut(img, Rect::at(x + 2, y + 2).of_size(26, 26), PAPER);
    if marked {
        draw_filled_rect_mut(img, Rect::at(x + 9, y + 9).of_size(12, 12), PEN);
    }
}

/// A 20-question, 3-option sheet with one mark per row.
fn sheet() -> DynamicImage {
    let mut img = GrayImage::from_pixel(220, 1060, PAPER);
    for row in 0..20 {
        for col in 0..3 {
            frame(&mut img, 40 + col * 60, 30 + row * 50, (row % 3) == col);
        }
    }
    DynamicImage::ImageLuma8(img)
}

fn bench_classify(c: &mut Criterion) {
    let classifier = CheckboxClassifier::from_config(&ExamConfig::default());
    let mut crop = GrayImage::from_pixel(30, 30, PAPER);
    frame(&mut crop, 0, 0, true);
    let crop = DynamicImage::ImageLuma8(crop);

    c.bench_function("classify checkbox (30x30)", |b| {
        b.iter(|| black_box(classifier.classify(black_box(&crop))));
    });
}

fn bench_page(c: &mut Criterion) {
    let cfg = ExamConfig {
        use_zone_detection: false,
        save_visualizations: false,
        ..ExamConfig::default()
    };
    let page = sheet();

    c.bench_function("process_page (20 questions)", |b| {
        b.iter(|| black_box(process_page(0, black_box(&page), &cfg, &NullZoneDetector, None)));
    });
}

criterion_group!(benches, bench_classify, bench_page);
criterion_main!(benches);
