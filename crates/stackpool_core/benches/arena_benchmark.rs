//! # Arena Performance Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - Bump allocation must beat the system allocator
//! - Stack-ordered release must be as cheap as allocation
//! - Reset must not depend on how much was allocated
//!
//! Run with: `cargo bench --package stackpool_core`

// Benchmarks don't need docs and release raw pointers directly
#![allow(missing_docs)]
#![allow(unsafe_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stackpool_core::{ArenaBox, FixedCapacityArena, RawAllocator, SystemAllocator};

/// Pool size used by every benchmark.
const POOL_BYTES: usize = 64 * 1024;

/// Benchmark: allocate/release pairs, arena vs system.
fn bench_alloc_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_release");

    for size in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("arena", size), &size, |b, &size| {
            let arena = FixedCapacityArena::<POOL_BYTES>::new();
            b.iter(|| {
                let ptr = arena.allocate(black_box(size));
                unsafe { arena.deallocate(ptr, size) };
            });
        });

        group.bench_with_input(BenchmarkId::new("system", size), &size, |b, &size| {
            let system = SystemAllocator;
            b.iter(|| {
                let ptr = system.allocate(black_box(size));
                unsafe { system.deallocate(ptr, size) };
            });
        });
    }

    group.finish();
}

/// Benchmark: a burst of small allocations freed all at once.
fn bench_burst_then_reset(c: &mut Criterion) {
    let mut arena = Box::new(FixedCapacityArena::<POOL_BYTES>::new());

    c.bench_function("burst_1K_then_reset", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(arena.allocate(24));
            }
            arena.reset();
        });
    });
}

/// Benchmark: typed boxes released in stack order.
fn bench_typed_boxes(c: &mut Criterion) {
    let arena = FixedCapacityArena::<POOL_BYTES>::new();

    c.bench_function("arena_box_nested_8", |b| {
        b.iter(|| {
            let a = ArenaBox::new_in([0u64; 4], &arena);
            let b2 = ArenaBox::new_in([1u64; 4], &arena);
            let c2 = ArenaBox::new_in([2u64; 4], &arena);
            black_box(a[0] + b2[0] + c2[0])
        });
    });
}

criterion_group!(benches, bench_alloc_release, bench_burst_then_reset, bench_typed_boxes);

criterion_main!(benches);
