use criterion::{black_box, criterion_group, criterion_main, Criterion};

use voxart::grid::{PixelGrid, Rgba};
use voxart::palette::Catalog;
use voxart::pipeline::{convert, ConvertOptions};
use voxart::voxel::FillMode;

/// Synthetic test image: a saturated disc on a dimmer gradient backdrop
fn create_test_image(size: usize) -> PixelGrid {
    let center = size as f32 / 2.0;
    let radius = size as f32 / 4.0;
    PixelGrid::from_fn(size, size, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if (dx * dx + dy * dy).sqrt() < radius {
            Rgba::opaque(220, 60, 40)
        } else {
            let v = (40 + x * 120 / size) as u8;
            Rgba::opaque(v, v, v + 30)
        }
    })
    .unwrap()
}

fn bench_convert_surface_64(c: &mut Criterion) {
    let image = create_test_image(256);
    let catalog = Catalog::builtin();
    let options = ConvertOptions {
        resolution: 64,
        ..ConvertOptions::default()
    };

    c.bench_function("convert_surface_64", |b| {
        b.iter(|| convert(black_box(&image), black_box(&options), &catalog))
    });
}

fn bench_convert_solid_96(c: &mut Criterion) {
    let image = create_test_image(256);
    let catalog = Catalog::builtin();
    let options = ConvertOptions {
        resolution: 96,
        depth_layers: 16,
        fill_mode: FillMode::Solid,
        ..ConvertOptions::default()
    };

    c.bench_function("convert_solid_96", |b| {
        b.iter(|| convert(black_box(&image), black_box(&options), &catalog))
    });
}

fn bench_convert_no_dither_64(c: &mut Criterion) {
    let image = create_test_image(256);
    let catalog = Catalog::builtin();
    let options = ConvertOptions {
        resolution: 64,
        dithering: false,
        ..ConvertOptions::default()
    };

    c.bench_function("convert_no_dither_64", |b| {
        b.iter(|| convert(black_box(&image), black_box(&options), &catalog))
    });
}

criterion_group!(
    benches,
    bench_convert_surface_64,
    bench_convert_solid_96,
    bench_convert_no_dither_64
);
criterion_main!(benches);
