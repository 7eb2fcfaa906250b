//! Benchmarks for the polygon overlap kernel.
//!
//! The predicate dominates the annealer's inner loop, so both the
//! full-test path (near pair) and the bbox-reject path (far pair) matter.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use treepack_core::{overlap, Layout, Pose, TreePoly};

fn bench_overlap_pair(c: &mut Criterion) {
    let a = TreePoly::at(0.0, 0.0, 15.0);
    let near = TreePoly::at(0.45, 0.3, 120.0);
    let far = TreePoly::at(10.0, 10.0, 60.0);

    c.bench_function("overlap_near_pair", |b| {
        b.iter(|| overlap(black_box(&a), black_box(&near)))
    });
    c.bench_function("overlap_bbox_reject", |b| {
        b.iter(|| overlap(black_box(&a), black_box(&far)))
    });
}

fn bench_layout_scans(c: &mut Criterion) {
    let poses: Vec<Pose> = (0..50)
        .map(|i| {
            Pose::new(
                (i % 10) as f64 * 1.1,
                (i / 10) as f64 * 1.3,
                (i * 37 % 360) as f64,
            )
        })
        .collect();
    let layout = Layout::from_poses(poses);

    c.bench_function("any_overlap_50", |b| {
        b.iter(|| black_box(&layout).any_overlap())
    });
    c.bench_function("has_overlap_50", |b| {
        b.iter(|| black_box(&layout).has_overlap(black_box(25)))
    });
}

criterion_group!(benches, bench_overlap_pair, bench_layout_scans);
criterion_main!(benches);
