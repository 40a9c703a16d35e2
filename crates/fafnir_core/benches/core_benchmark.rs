//! # Entity Core Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - Entity create/destroy churn stays O(1) per operation
//! - Bulk velocity integration is a linear walk, no map lookups per field
//! - A GC pass over a fully-live manager costs a handful of probes
//!
//! Run with: `cargo bench --package fafnir_core`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fafnir_core::{Mat4, Vec3, Velocity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Entity population for the steady-state benchmarks.
const ENTITY_COUNT: usize = 100_000;

/// Benchmark: entity create/destroy churn through the free-index FIFO.
fn bench_entity_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_churn");

    for count in [1_000, 10_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut world = World::new();
                let handles: Vec<_> = (0..count).map(|_| world.entities.create()).collect();
                for e in handles {
                    world.entities.destroy(black_box(e));
                }
                world.entities.allocated()
            });
        });
    }

    group.finish();
}

/// Benchmark: batch velocity integration over a flat population.
fn bench_update_pass(c: &mut Criterion) {
    let mut world = World::new();
    for i in 0..ENTITY_COUNT {
        let e = world.entities.create();
        let f = i as f32;
        world
            .transforms
            .create(e, Mat4::from_translation(Vec3::new(f, 0.0, 0.0)));
        world.velocities.create_with(e, Velocity::new(0.1, 0.2, 0.3));
    }

    c.bench_function("update_pass_100k", |b| {
        b.iter(|| {
            world.update(black_box(0.016));
        });
    });
}

/// Benchmark: world-pose propagation through a deep chain.
fn bench_subtree_propagation(c: &mut Criterion) {
    let mut world = World::new();
    let mut prev = world
        .transforms
        .create(world.entities.create(), Mat4::IDENTITY);
    let root = prev;
    for _ in 0..1_000 {
        let t = world
            .transforms
            .create(world.entities.create(), Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        world.transforms.set_parent(t, prev);
        prev = t;
    }

    c.bench_function("propagate_chain_1k", |b| {
        b.iter(|| {
            world
                .transforms
                .set_local(root, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        });
    });
}

/// Benchmark: GC probe cost when nothing is dead.
fn bench_gc_no_dead(c: &mut Criterion) {
    let mut world = World::new();
    for _ in 0..ENTITY_COUNT {
        let e = world.entities.create();
        world.velocities.create(e);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("gc_all_live_100k", |b| {
        b.iter(|| black_box(world.gc(&mut rng)));
    });
}

criterion_group!(
    benches,
    bench_entity_churn,
    bench_update_pass,
    bench_subtree_propagation,
    bench_gc_no_dead
);
criterion_main!(benches);
