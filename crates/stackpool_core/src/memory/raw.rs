//! # Allocator Capability
//!
//! The seam every allocation in this crate goes through. Types take an
//! allocator as a parameter instead of hooking global allocation.

// SAFETY: This module wraps the global allocator and must use raw pointers.
// Every unsafe block states the contract it relies on.
#![allow(unsafe_code)]

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

use parking_lot::Mutex;

use super::MAX_ALIGN;
use crate::error::{MemoryError, MemoryResult};

/// An untyped byte allocator.
///
/// Implementations return memory aligned to [`MAX_ALIGN`] and usable for at
/// least the requested number of bytes. There is no per-allocation
/// bookkeeping: callers hand the original `size` back on release.
pub trait RawAllocator {
    /// Allocates `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::SizeOverflow`] when `size` cannot form a layout
    /// and [`MemoryError::OutOfMemory`] when the underlying allocator is
    /// exhausted.
    fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>>;

    /// Allocates `size` bytes, treating failure as fatal.
    fn allocate(&self, size: usize) -> NonNull<u8> {
        match self.try_allocate(size) {
            Ok(ptr) => ptr,
            Err(err) => err.raise(),
        }
    }

    /// Releases memory obtained from this allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate`/`try_allocate` on this same
    /// allocator with the same `size`, and must not be released twice.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize);
}

impl<A: RawAllocator + ?Sized> RawAllocator for &A {
    #[inline]
    fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        (**self).try_allocate(size)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: forwarded contract.
        unsafe { (**self).deallocate(ptr, size) }
    }
}

/// Locking wrapper for sharing a single-threaded allocator, e.g. from a `static`.
impl<A: RawAllocator> RawAllocator for Mutex<A> {
    fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        self.lock().try_allocate(size)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: forwarded contract.
        unsafe { self.lock().deallocate(ptr, size) }
    }
}

/// The process-wide general-purpose allocator.
///
/// Zero-byte requests are served as one byte so every pointer is real and
/// unique; release uses the same rounding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SystemAllocator;

impl SystemAllocator {
    fn layout_for(size: usize) -> MemoryResult<Layout> {
        Layout::from_size_align(size.max(1), MAX_ALIGN).map_err(|_| MemoryError::SizeOverflow { size })
    }
}

impl RawAllocator for SystemAllocator {
    fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        let layout = Self::layout_for(size)?;
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr).ok_or(MemoryError::OutOfMemory { layout })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // A size that allocated successfully always produces a layout again.
        if let Ok(layout) = Self::layout_for(size) {
            // SAFETY: caller guarantees ptr came from `alloc` with this layout.
            unsafe { dealloc(ptr.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_alignment() {
        let system = SystemAllocator;
        for size in [0, 1, 7, 16, 33, 4096] {
            let ptr = system.allocate(size);
            assert_eq!(ptr.as_ptr() as usize % MAX_ALIGN, 0);
            unsafe { system.deallocate(ptr, size) };
        }
    }

    #[test]
    fn test_system_size_overflow() {
        let err = SystemAllocator.try_allocate(usize::MAX).unwrap_err();
        assert_eq!(err, MemoryError::SizeOverflow { size: usize::MAX });
    }

    #[test]
    fn test_reference_and_mutex_forwarding() {
        let system = SystemAllocator;
        let by_ref = &system;
        let ptr = by_ref.allocate(8);
        unsafe { by_ref.deallocate(ptr, 8) };

        let locked = Mutex::new(SystemAllocator);
        let ptr = locked.allocate(8);
        unsafe { locked.deallocate(ptr, 8) };
    }
}
