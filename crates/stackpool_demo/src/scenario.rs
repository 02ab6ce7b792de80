//! # User Pool Scenario
//!
//! A `User` type whose instances live in a 1 KiB pool instead of on the heap.
//! The heap is a [`CountingAllocator`], so every byte that escapes the pool
//! shows up in the report.

// SAFETY: The benchmark releases each raw block it allocates exactly once,
// with the size it was allocated with.
#![allow(unsafe_code)]

use std::hint::black_box;
use std::time::Duration;

use stackpool_core::{
    measure_scope, AllocationSnapshot, ArenaArray, ArenaBox, ArenaStats, CountingAllocator,
    FixedCapacityArena, RawAllocator, ScopedTimer, SystemAllocator,
};

use crate::config::DemoConfig;

/// Bytes reserved for users.
pub const USER_POOL_BYTES: usize = 1024;

/// Bytes reserved for the benchmark pool.
pub const BENCH_POOL_BYTES: usize = 4096;

/// The pool users are allocated from, spilling to a counted heap.
pub type UserPool<'h> = FixedCapacityArena<USER_POOL_BYTES, &'h CountingAllocator>;

/// A small record that is always allocated through a [`UserPool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct User {
    /// Identifier.
    pub id: u32,
    /// Experience level.
    pub level: u16,
    /// Account flags.
    pub flags: u16,
    /// Lifetime score.
    pub score: u64,
}

impl User {
    /// A fresh user with the given id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            level: 1,
            flags: 0,
            score: 0,
        }
    }

    /// Places one user in `pool`.
    pub fn boxed_in<'a, 'h>(id: u32, pool: &'a UserPool<'h>) -> ArenaBox<'a, Self, UserPool<'h>> {
        ArenaBox::new_in(Self::new(id), pool)
    }

    /// Places `count` users with consecutive ids in `pool` as one block.
    pub fn array_in<'a, 'h>(count: usize, pool: &'a UserPool<'h>) -> ArenaArray<'a, Self, UserPool<'h>> {
        ArenaArray::from_fn_in(count, |i| Self::new(u32::try_from(i).unwrap_or(u32::MAX)), pool)
    }
}

/// Heap and pool figures collected while replaying the scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Users in the pooled array.
    pub user_count: usize,
    /// Heap bytes after boxing a single user.
    pub heap_after_single: usize,
    /// Heap bytes after building the user array.
    pub heap_after_array: usize,
    /// Heap bytes after boxing a second user.
    pub heap_after_boxed: usize,
    /// Heap bytes after boxing a plain integer outside the pool.
    pub heap_after_plain: usize,
    /// Pool bytes in use while the array was alive.
    pub pool_peak_used: usize,
    /// Pool state just before the last user is released.
    pub pool: ArenaStats,
    /// Heap counters once everything is released.
    pub heap: AllocationSnapshot,
}

/// Replays the scenario: single user, user array, boxed user, plain integer.
#[must_use]
pub fn run_scenario(config: &DemoConfig) -> ScenarioReport {
    measure_scope!("run_scenario");
    tracing::debug!(user_count = config.user_count, "running user pool scenario");

    let heap = CountingAllocator::system();
    let pool: UserPool<'_> = FixedCapacityArena::with_fallback(&heap);

    let single = User::boxed_in(1, &pool);
    let heap_after_single = heap.bytes_allocated();
    drop(single);

    let users = User::array_in(config.user_count, &pool);
    let heap_after_array = heap.bytes_allocated();
    let pool_peak_used = pool.used();
    drop(users);

    let boxed = User::boxed_in(2, &pool);
    let heap_after_boxed = heap.bytes_allocated();

    let plain = ArenaBox::new_in(0_i32, &heap);
    let heap_after_plain = heap.bytes_allocated();
    drop(plain);

    let pool_stats = pool.stats();
    drop(boxed);

    ScenarioReport {
        user_count: config.user_count,
        heap_after_single,
        heap_after_array,
        heap_after_boxed,
        heap_after_plain,
        pool_peak_used,
        pool: pool_stats,
        heap: heap.snapshot(),
    }
}

/// Timings for the same workload against the arena and the system allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkReport {
    /// Allocate/release pairs per allocator.
    pub rounds: usize,
    /// Bytes per request.
    pub request_size: usize,
    /// Total time with the arena.
    pub arena: Duration,
    /// Total time with the system allocator.
    pub system: Duration,
    /// Requests the arena could not hold.
    pub arena_fallbacks: usize,
}

fn time_rounds<A: RawAllocator>(label: &'static str, alloc: &A, rounds: usize, size: usize) -> Duration {
    let timer = ScopedTimer::new(label);
    for _ in 0..rounds {
        let block = black_box(alloc.allocate(size));
        // SAFETY: `block` was just allocated from `alloc` with `size`.
        unsafe { alloc.deallocate(block, size) };
    }
    timer.elapsed()
}

/// Times `benchmark_rounds` allocate/release pairs of `request_size` bytes.
#[must_use]
pub fn run_benchmark(config: &DemoConfig) -> BenchmarkReport {
    let arena = FixedCapacityArena::<BENCH_POOL_BYTES>::new();
    let arena_time = time_rounds("arena_rounds", &arena, config.benchmark_rounds, config.request_size);
    let system_time = time_rounds("system_rounds", &SystemAllocator, config.benchmark_rounds, config.request_size);

    BenchmarkReport {
        rounds: config.benchmark_rounds,
        request_size: config.request_size,
        arena: arena_time,
        system: system_time,
        arena_fallbacks: arena.stats().fallback_allocations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fits_alignment_slot() {
        assert_eq!(std::mem::size_of::<User>(), 16);
    }

    #[test]
    fn test_default_scenario_stays_off_heap() {
        let report = run_scenario(&DemoConfig::default());
        assert_eq!(report.heap_after_single, 0);
        assert_eq!(report.heap_after_array, 0);
        assert_eq!(report.heap_after_boxed, 0);
        assert_eq!(report.heap_after_plain, 4);
        assert_eq!(report.pool_peak_used, 160);
        assert_eq!(report.pool.used, 16);
        assert_eq!(report.pool.fallback_allocations, 0);
        assert_eq!(report.heap.live_bytes(), 0);
    }

    #[test]
    fn test_large_array_spills_to_heap() {
        let config = DemoConfig {
            user_count: 100,
            ..DemoConfig::default()
        };
        let report = run_scenario(&config);
        assert_eq!(report.heap_after_single, 0);
        assert_eq!(report.heap_after_array, 1600);
        assert_eq!(report.pool_peak_used, 0);
        assert_eq!(report.heap_after_plain, 1604);
        assert_eq!(report.pool.fallback_allocations, 1);
        assert_eq!(report.heap.live_bytes(), 0);
    }

    #[test]
    fn test_rounds_are_bare_allocate_release_pairs() {
        let heap = CountingAllocator::system();
        let _ = time_rounds("counted_rounds", &heap, 5, 24);
        let snapshot = heap.snapshot();
        assert_eq!(snapshot.allocations, 5);
        assert_eq!(snapshot.bytes_allocated, 5 * 24);
        assert_eq!(snapshot.live_bytes(), 0);

        let arena = FixedCapacityArena::<BENCH_POOL_BYTES>::new();
        let _ = time_rounds("arena_rounds", &arena, 5, 24);
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.stats().stranded_bytes, 0);
    }

    #[test]
    fn test_benchmark_counts_fallbacks() {
        let config = DemoConfig {
            benchmark_rounds: 8,
            request_size: BENCH_POOL_BYTES + 1,
            ..DemoConfig::default()
        };
        let report = run_benchmark(&config);
        assert_eq!(report.rounds, 8);
        assert_eq!(report.arena_fallbacks, 8);

        let small = run_benchmark(&DemoConfig {
            benchmark_rounds: 8,
            ..DemoConfig::default()
        });
        assert_eq!(small.arena_fallbacks, 0);
    }
}
