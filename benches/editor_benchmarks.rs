//! Performance benchmarks for photogen
//!
//! Measures the pixel work that runs synchronously on every save: the
//! kernels, the full enhancement render and strip composition.

use criterion::*;
use image::Rgba;
use itertools::iproduct;
use photogen::{
    render, BoxBlur, ComposeStrip, CropGeometry, EnhancementParams, GridSpec, Image, Sharpen,
    StripConfig,
};
use std::hint::black_box;

/// Helper function to create a portrait-sized test image with a skin-toned centre
fn create_portrait_image(width: u32, height: u32) -> Image<Rgba<u8>> {
    let mut image: Image<Rgba<u8>> = Image::new(width, height);

    iproduct!(0..height, 0..width).for_each(|(y, x)| {
        let inside = x > width / 4 && x < 3 * width / 4 && y > height / 5 && y < 4 * height / 5;
        let pixel = if inside {
            let shade = ((x ^ y) & 15) as u8;
            Rgba([210 + shade, 160 + shade, 128 + shade, 255])
        } else {
            Rgba([((x * 255) / width) as u8, 90, 200, 255])
        };
        image.put_pixel(x, y, pixel);
    });

    image
}

fn sizes() -> Vec<(u32, u32)> {
    vec![
        (350, 450),   // Passport crop
        (1000, 1000), // Large
        (1920, 1080), // HD
    ]
}

/// Benchmark the separable box blur across radii
fn bench_box_blur(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_blur");
    group.sample_size(10);

    for ((width, height), radius) in iproduct!(sizes(), [1u32, 5, 10]) {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        let image = create_portrait_image(width, height);

        group.bench_with_input(
            BenchmarkId::new(format!("radius_{radius}"), format!("{width}x{height}")),
            &image,
            |b, img| b.iter(|| black_box(img.box_blur(radius).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark the 3x3 sharpening convolution
fn bench_sharpen(c: &mut Criterion) {
    let mut group = c.benchmark_group("sharpen");
    group.sample_size(10);

    for (width, height) in sizes() {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        let image = create_portrait_image(width, height);

        group.bench_with_input(
            BenchmarkId::new("amount_2.5", format!("{width}x{height}")),
            &image,
            |b, img| b.iter(|| black_box(img.sharpen(2.5).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark the complete enhancement render
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    let colour_only = EnhancementParams {
        brightness: 110.0,
        contrast: 120.0,
        saturation: 90.0,
        exposure: 105.0,
        ..Default::default()
    };
    let everything = EnhancementParams {
        skin_smooth: 4.0,
        sharpness: 2.0,
        ..colour_only
    };

    for (width, height) in sizes() {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        let image = create_portrait_image(width, height);

        for (label, params) in [("colour_only", colour_only), ("full_pipeline", everything)] {
            group.bench_with_input(
                BenchmarkId::new(label, format!("{width}x{height}")),
                &image,
                |b, img| b.iter(|| black_box(render(img, &params).unwrap())),
            );
        }
    }

    group.finish();
}

/// Benchmark strip composition at full and preview resolution
fn bench_strip(c: &mut Criterion) {
    let mut group = c.benchmark_group("strip");
    group.sample_size(10);

    let image = create_portrait_image(1000, 1000);
    let crop = CropGeometry {
        x: 150,
        y: 100,
        width: 700,
        height: 900,
        rotation_degrees: 0.0,
        aspect_ratio_label: Some("Passport".to_string()),
    };
    let config = StripConfig::default();

    for (rows, cols) in [(1, 1), (2, 3), (4, 4)] {
        let grid = GridSpec::new(rows, cols, 10, "#FFFFFF");
        let id = format!("{rows}x{cols}");

        group.bench_with_input(BenchmarkId::new("full", &id), &grid, |b, grid| {
            b.iter(|| black_box(image.compose_strip(Some(&crop), grid, &config).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("preview", &id), &grid, |b, grid| {
            b.iter(|| black_box(image.compose_preview(Some(&crop), grid, &config).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_box_blur, bench_sharpen, bench_render, bench_strip);
criterion_main!(benches);
