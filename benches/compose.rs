//! Benchmarks for grid compositing
//!
//! Measures layout planning, canvas tiling and the tilt-and-crop resampler.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use postergrid::compose::{compose_grid, tile_canvas, GridLayout, Rotation, TILT_DEGREES};
use postergrid::devices::{default_profiles, DeviceProfile};
use postergrid::encode::{encode_jpeg, search_quality};
use postergrid_common::DeviceCategory;

fn posters(count: u8) -> Vec<DynamicImage> {
    (0..count)
        .map(|i| {
            DynamicImage::ImageRgb8(RgbImage::from_fn(100, 150, |x, y| {
                Rgb([i.wrapping_mul(23), (x * 2) as u8, (y + u32::from(i)) as u8])
            }))
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let profiles = default_profiles();
    c.bench_function("layout_plan_all_profiles", |b| {
        b.iter(|| {
            for profile in &profiles {
                black_box(GridLayout::plan(black_box(profile)));
            }
        })
    });
}

fn bench_tiling(c: &mut Criterion) {
    let profile = DeviceProfile::new("Bench", 960, 540, 1.0, DeviceCategory::Desktop);
    let layout = GridLayout::plan(&profile);
    let tiles: Vec<Option<RgbImage>> = (0..10u8)
        .map(|i| {
            Some(RgbImage::from_pixel(
                layout.tile_width,
                layout.tile_height,
                Rgb([i * 20, 80, 160]),
            ))
        })
        .collect();

    c.bench_function("tile_canvas_960x540", |b| {
        b.iter(|| black_box(tile_canvas(&layout, &tiles)))
    });
}

fn bench_rotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("tilt_and_crop");
    group.sample_size(10);

    for (w, h) in [(640u32, 360u32), (1280, 720)] {
        let profile = DeviceProfile::new("Bench", w, h, 1.0, DeviceCategory::Desktop);
        let layout = GridLayout::plan(&profile);
        let canvas = RgbImage::from_fn(layout.canvas_side, layout.canvas_side, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let window = Rotation::degrees(TILT_DEGREES).crop_window(
            layout.canvas_side,
            layout.canvas_side,
            layout.width,
            layout.height,
        );
        group.bench_with_input(BenchmarkId::new("resample", format!("{w}x{h}")), &canvas, |b, canvas| {
            b.iter(|| black_box(window.resample(canvas).unwrap()))
        });
    }
    group.finish();
}

fn bench_compose_and_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    let posters = posters(10);
    let profile = DeviceProfile::new("Bench", 960, 540, 1.0, DeviceCategory::Desktop);
    group.bench_function("compose_grid_960x540", |b| {
        b.iter(|| black_box(compose_grid(&profile, &posters).unwrap()))
    });

    let canvas = compose_grid(&profile, &posters)
        .unwrap()
        .map(|c| c.image)
        .unwrap();
    group.bench_function("jpeg_quality_search_960x540", |b| {
        b.iter(|| {
            black_box(
                search_quality(100 * 1024, |q| Ok(encode_jpeg(&canvas, q, false)?.len())).unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_layout,
    bench_tiling,
    bench_rotate,
    bench_compose_and_search
);
criterion_main!(benches);
