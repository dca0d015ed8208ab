//! Benchmarks for datagen
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use datagen::generator::{TreeGenerator, TreeShape};
use datagen::pool::WorkerPool;
use datagen::walker::{DirectoryQuerier, EntryCounters, QueryMode};
use std::sync::Arc;

fn benchmark_pool_submit_drain(c: &mut Criterion) {
    let pool = WorkerPool::new(4).unwrap();

    c.bench_function("pool_submit_drain_1000", |b| {
        b.iter(|| {
            for i in 0..1000u64 {
                let _ = pool.submit(move || black_box(i * 2));
            }
            pool.drain();
        })
    });

    c.bench_function("pool_submit_join", |b| {
        b.iter(|| {
            let handle = pool.submit(|| black_box(42u64)).unwrap();
            black_box(handle.join().unwrap());
        })
    });
}

fn benchmark_query_modes(c: &mut Criterion) {
    let root = tempfile::tempdir().unwrap();
    let shape = TreeShape {
        num_levels: 3,
        dirs_per_level: 6,
        files_per_dir: 4,
        file_size_kb: 0,
        target_level: 3,
        files_at_target_level: 8,
    };
    {
        let pool = WorkerPool::new(4).unwrap();
        TreeGenerator::new(shape, &pool).generate(root.path());
    }

    let sequential = DirectoryQuerier::new(root.path(), QueryMode::Sequential).unwrap();
    c.bench_function("query_sequential", |b| {
        b.iter(|| black_box(sequential.query_recursively(&Arc::new(EntryCounters::new()))))
    });

    let concurrent =
        DirectoryQuerier::new(root.path(), QueryMode::Concurrent { workers: 4 }).unwrap();
    c.bench_function("query_concurrent", |b| {
        b.iter(|| black_box(concurrent.query_recursively(&Arc::new(EntryCounters::new()))))
    });
}

criterion_group!(benches, benchmark_pool_submit_drain, benchmark_query_modes);
criterion_main!(benches);
