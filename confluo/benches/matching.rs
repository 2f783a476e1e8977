//! Benchmarks for the offset search.
//! Run with: cargo bench -p confluo --bench matching

use std::hint::black_box;

use confluo::{AlignConfig, AlignMethod, AlignStrategy, Aligner, Buffer, Frame, Frames, Matcher};
use confluo::{DiffMetric, MatchConfig, Watcher};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smooth scene with fine noise on top, so the search has a single basin but
/// no flat regions.
fn scene(size: usize, seed: u64) -> Buffer<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centre = size as f64 / 2.0;
    let spread = 2.0 * (size as f64 / 4.0).powi(2);
    Buffer::from_fn(size, size, |x, y| {
        let (dx, dy) = (x as f64 - centre, y as f64 - centre);
        let blob = (-(dx * dx + dy * dy) / spread).exp();
        let noise: f64 = rng.random_range(-0.03..0.03);
        ((0.1 + 0.8 * blob + noise).clamp(0.0, 1.0) * 255.0).round() as u8
    })
}

fn cut(scene: &Buffer<u8>, x: usize, y: usize, size: usize) -> Buffer<u8> {
    let mut view = scene.clone();
    view.crop(x, y, size, size);
    view.to_compact()
}

fn benchmark_find_offset(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_offset");

    for size in [64usize, 256, 512] {
        let scene = scene(size + size / 4, 7);
        let a = cut(&scene, 0, 0, size);
        let b = cut(&scene, size / 8, size / 16, size);
        group.throughput(Throughput::Elements((size * size) as u64));

        for metric in [DiffMetric::L1, DiffMetric::L2] {
            let matcher = Matcher::new(MatchConfig::default().with_metric(metric));
            group.bench_function(BenchmarkId::new(metric.to_string(), size), |bench| {
                bench.iter(|| {
                    black_box(matcher.find_offset(black_box(&a), black_box(&b), None, None))
                })
            });
        }
    }

    group.finish();
}

fn benchmark_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    group.sample_size(10);

    let scene = scene(320, 11);
    let corners = [(0, 0), (20, 8), (40, 30), (12, 52), (60, 16), (34, 64), (70, 70), (8, 24)];
    let frames: Frames<u8> = corners
        .iter()
        .map(|&(x, y)| Frame::new(vec![cut(&scene, x, y, 240)]))
        .collect();

    for method in [AlignMethod::Sequential, AlignMethod::Tree] {
        let aligner = AlignStrategy::new(AlignConfig::default().with_method(method));
        group.bench_function(BenchmarkId::new("frames_8", method), |bench| {
            bench.iter(|| {
                let mut frames = frames.clone();
                let report = aligner.align(&mut frames, &Watcher::default());
                black_box(report)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_find_offset, benchmark_align);
criterion_main!(benches);
