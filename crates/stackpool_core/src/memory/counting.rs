//! # Counting Allocator
//!
//! Instrumented wrapper that records traffic through an inner allocator.
//! Inject it where heap usage has to be observed (tests, diagnostics)
//! instead of replacing the process-wide allocator.

// SAFETY: Forwards raw pointers to the wrapped allocator unchanged.
#![allow(unsafe_code)]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::raw::{RawAllocator, SystemAllocator};
use crate::error::MemoryResult;

/// Point-in-time copy of a [`CountingAllocator`]'s counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationSnapshot {
    /// Successful allocation calls.
    pub allocations: usize,
    /// Release calls.
    pub deallocations: usize,
    /// Bytes requested by successful allocations.
    pub bytes_allocated: usize,
    /// Bytes handed back on release.
    pub bytes_released: usize,
}

impl AllocationSnapshot {
    /// Bytes allocated and not yet released.
    #[inline]
    #[must_use]
    pub const fn live_bytes(&self) -> usize {
        self.bytes_allocated.saturating_sub(self.bytes_released)
    }

    /// Allocations not yet released.
    #[inline]
    #[must_use]
    pub const fn live_allocations(&self) -> usize {
        self.allocations.saturating_sub(self.deallocations)
    }
}

/// A [`RawAllocator`] that counts calls and bytes, then forwards to `A`.
///
/// Counters use relaxed atomics: they are statistics, not synchronization.
///
/// # Example
///
/// ```rust
/// use stackpool_core::{CountingAllocator, FixedCapacityArena, RawAllocator};
///
/// let heap = CountingAllocator::system();
/// let arena: FixedCapacityArena<64, &CountingAllocator> = FixedCapacityArena::with_fallback(&heap);
///
/// let _in_pool = arena.allocate(32);
/// assert_eq!(heap.bytes_allocated(), 0);
///
/// let _spilled = arena.allocate(64);
/// assert_eq!(heap.bytes_allocated(), 64);
/// assert_eq!(arena.stats().fallback_allocations, 1);
/// ```
#[derive(Debug, Default)]
pub struct CountingAllocator<A: RawAllocator = SystemAllocator> {
    inner: A,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    bytes_allocated: AtomicUsize,
    bytes_released: AtomicUsize,
}

impl CountingAllocator<SystemAllocator> {
    /// Counts traffic to the system allocator.
    #[must_use]
    pub const fn system() -> Self {
        Self::new(SystemAllocator)
    }
}

impl<A: RawAllocator> CountingAllocator<A> {
    /// Wraps `inner` with zeroed counters.
    #[must_use]
    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            bytes_allocated: AtomicUsize::new(0),
            bytes_released: AtomicUsize::new(0),
        }
    }

    /// The wrapped allocator.
    #[inline]
    #[must_use]
    pub const fn inner(&self) -> &A {
        &self.inner
    }

    /// Total bytes requested so far.
    #[inline]
    #[must_use]
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.load(Ordering::Relaxed)
    }

    /// Number of successful allocation calls so far.
    #[inline]
    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Copies all counters.
    #[must_use]
    pub fn snapshot(&self) -> AllocationSnapshot {
        AllocationSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            bytes_released: self.bytes_released.load(Ordering::Relaxed),
        }
    }

    /// Zeroes all counters.
    pub fn clear(&self) {
        self.allocations.store(0, Ordering::Relaxed);
        self.deallocations.store(0, Ordering::Relaxed);
        self.bytes_allocated.store(0, Ordering::Relaxed);
        self.bytes_released.store(0, Ordering::Relaxed);
    }
}

impl<A: RawAllocator> RawAllocator for CountingAllocator<A> {
    fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        let ptr = self.inner.try_allocate(size)?;
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated.fetch_add(size, Ordering::Relaxed);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_released.fetch_add(size, Ordering::Relaxed);
        // SAFETY: forwarded contract.
        unsafe { self.inner.deallocate(ptr, size) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_traffic() {
        let heap = CountingAllocator::system();
        let a = heap.allocate(4);
        let b = heap.allocate(100);
        assert_eq!(heap.allocation_count(), 2);
        assert_eq!(heap.bytes_allocated(), 104);

        unsafe { heap.deallocate(a, 4) };
        let snapshot = heap.snapshot();
        assert_eq!(snapshot.live_bytes(), 100);
        assert_eq!(snapshot.live_allocations(), 1);

        unsafe { heap.deallocate(b, 100) };
        assert_eq!(heap.snapshot().live_bytes(), 0);
    }

    #[test]
    fn test_failed_allocation_not_counted() {
        let heap = CountingAllocator::system();
        assert!(heap.try_allocate(usize::MAX).is_err());
        assert_eq!(heap.snapshot(), AllocationSnapshot::default());
    }

    #[test]
    fn test_clear() {
        let heap = CountingAllocator::system();
        let ptr = heap.allocate(8);
        unsafe { heap.deallocate(ptr, 8) };
        heap.clear();
        assert_eq!(heap.snapshot(), AllocationSnapshot::default());
    }
}
