//! # Arena Allocator
//!
//! A fixed-capacity bump allocator that hands out memory from an inline
//! buffer and transparently falls back to another allocator when full.

// SAFETY: This module hands out raw pointers into its own buffer.
// All unsafe blocks are documented with the bound they rely on.
#![allow(unsafe_code)]

use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::marker::PhantomPinned;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use super::raw::{RawAllocator, SystemAllocator};
use super::{align_up, MAX_ALIGN};
use crate::error::MemoryResult;

/// Inline byte buffer aligned to [`MAX_ALIGN`].
#[repr(C, align(16))]
struct Storage<const N: usize>(UnsafeCell<[MaybeUninit<u8>; N]>);

const _: () = assert!(std::mem::align_of::<Storage<0>>() == MAX_ALIGN);

/// Counters describing an arena's state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total buffer size in bytes.
    pub capacity: usize,
    /// Bytes committed in the buffer.
    pub used: usize,
    /// Bytes still available in the buffer.
    pub remaining: usize,
    /// Requests the buffer could not hold, served by the fallback.
    pub fallback_allocations: usize,
    /// In-buffer bytes released out of order and not reclaimed.
    pub stranded_bytes: usize,
}

/// A bump-pointer memory pool of `N` bytes with a fallback allocator.
///
/// Allocations are rounded up to [`MAX_ALIGN`] and carved off the front of
/// the buffer. Releasing the most recent allocation rewinds the cursor;
/// releasing anything else inside the buffer leaves a stranded fragment
/// until [`reset`](Self::reset). When the buffer cannot hold a request, it
/// is forwarded to `F`.
///
/// # Address Stability
///
/// The buffer lives inside the arena value. Moving the arena invalidates
/// every address it has issued, so the type is neither `Clone` nor `Unpin`.
/// [`ArenaBox`](super::ArenaBox) and [`ArenaArray`](super::ArenaArray)
/// borrow the arena, which keeps it in place while they live. For a shared
/// instance with a fixed address, put the arena in a
/// `static parking_lot::Mutex`.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread or wrap in a mutex.
///
/// # Example
///
/// ```rust
/// # #![allow(unsafe_code)]
/// use stackpool_core::FixedCapacityArena;
///
/// let arena = FixedCapacityArena::<1024>::new();
///
/// let a = arena.allocate(10);
/// let b = arena.allocate(20);
/// assert_eq!(arena.used(), 48);
///
/// // Most recent allocation first: the space comes back.
/// unsafe { arena.deallocate(b, 20) };
/// assert_eq!(arena.used(), 16);
/// assert_eq!(arena.allocate(5), b);
/// # let _ = a;
/// ```
pub struct FixedCapacityArena<const N: usize, F: RawAllocator = SystemAllocator> {
    /// The reserved buffer.
    storage: Storage<N>,
    /// Offset of the next free byte.
    cursor: Cell<usize>,
    /// Where requests go when the buffer is full.
    fallback: F,
    fallback_allocations: Cell<usize>,
    stranded_bytes: Cell<usize>,
    _pinned: PhantomPinned,
}

impl<const N: usize> FixedCapacityArena<N, SystemAllocator> {
    /// Creates an empty arena that falls back to the system allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_fallback(SystemAllocator)
    }
}

impl<const N: usize> Default for FixedCapacityArena<N, SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, F: RawAllocator> FixedCapacityArena<N, F> {
    /// Creates an empty arena that falls back to `fallback`.
    #[must_use]
    pub const fn with_fallback(fallback: F) -> Self {
        Self {
            storage: Storage(UnsafeCell::new([MaybeUninit::uninit(); N])),
            cursor: Cell::new(0),
            fallback,
            fallback_allocations: Cell::new(0),
            stranded_bytes: Cell::new(0),
            _pinned: PhantomPinned,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the bytes currently committed in the buffer.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Returns the bytes still free in the buffer.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        N - self.cursor.get()
    }

    /// Address of the first byte of the buffer.
    #[inline]
    #[must_use]
    pub fn storage_start(&self) -> *const u8 {
        self.base()
    }

    /// Returns true if `ptr` points into the buffer.
    #[inline]
    #[must_use]
    pub fn owns(&self, ptr: *const u8) -> bool {
        (ptr as usize)
            .checked_sub(self.base() as usize)
            .is_some_and(|offset| offset < N)
    }

    /// The allocator that serves requests the buffer cannot hold.
    #[inline]
    #[must_use]
    pub const fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Snapshot of the arena's counters.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: N,
            used: self.used(),
            remaining: self.remaining(),
            fallback_allocations: self.fallback_allocations.get(),
            stranded_bytes: self.stranded_bytes.get(),
        }
    }

    /// Allocates `size` bytes, from the buffer if they fit.
    ///
    /// # Errors
    ///
    /// Only fails when the request spills to the fallback and the fallback
    /// fails; the fallback's error is returned unchanged.
    pub fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        let offset = self.cursor.get();
        if let Some(aligned) = align_up(size) {
            if N - offset >= aligned {
                self.cursor.set(offset + aligned);
                return Ok(self.pointer_at(offset));
            }
        }

        let ptr = self.fallback.try_allocate(size)?;
        self.fallback_allocations.set(self.fallback_allocations.get() + 1);
        tracing::trace!(size, capacity = N, used = offset, "arena exhausted, served by fallback");
        Ok(ptr)
    }

    /// Allocates `size` bytes. Fallback failure is fatal.
    #[inline]
    pub fn allocate(&self, size: usize) -> NonNull<u8> {
        match self.try_allocate(size) {
            Ok(ptr) => ptr,
            Err(err) => err.raise(),
        }
    }

    /// Releases an allocation.
    ///
    /// Space is reclaimed only for the most recent in-buffer allocation.
    /// Older in-buffer allocations stay stranded until [`reset`](Self::reset).
    /// Pointers outside the buffer go back to the fallback.
    ///
    /// # Safety
    ///
    /// `ptr` must come from this arena's `allocate`/`try_allocate` with the
    /// same `size` and must not have been released already. In-buffer
    /// pointers issued before the last `reset` must not be released at all.
    /// Neither may pointers issued before the arena was moved: the buffer
    /// moves with it, so an old in-buffer pointer no longer lies inside it
    /// and would be handed to the fallback.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        let Some(offset) = self.offset_of(ptr, size) else {
            tracing::trace!(size, "releasing fallback allocation");
            // SAFETY: not in the buffer, so the caller's contract means it
            // came from the fallback with this size.
            unsafe { self.fallback.deallocate(ptr, size) };
            return;
        };

        let aligned = align_up(size).unwrap_or(0);
        if offset.checked_add(aligned) == Some(self.cursor.get()) {
            self.cursor.set(offset);
        } else if aligned > 0 {
            let stranded = self.stranded_bytes.get() + aligned;
            self.stranded_bytes.set(stranded);
            tracing::debug!(offset, size = aligned, stranded, "out-of-order release, space not reclaimed");
        }
    }

    /// Rewinds the cursor to the start of the buffer.
    ///
    /// Taking `&mut self` guarantees no `ArenaBox`/`ArenaArray` still borrows
    /// the arena. Raw pointers previously returned by `allocate` become
    /// dangling and must not be used or released.
    pub fn reset(&mut self) {
        tracing::debug!(used = self.cursor.get(), stranded = self.stranded_bytes.get(), "arena reset");
        self.cursor.set(0);
        self.stranded_bytes.set(0);
    }

    #[inline]
    fn base(&self) -> *mut u8 {
        self.storage.0.get().cast::<u8>()
    }

    #[inline]
    fn pointer_at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= N);
        // SAFETY: offset <= N keeps the pointer inside the buffer or one past
        // its end, and the buffer address is never null.
        unsafe { NonNull::new_unchecked(self.base().add(offset)) }
    }

    /// Buffer offset of `ptr`, if it was issued from the buffer.
    ///
    /// A zero-sized allocation made on a full buffer sits one past the end.
    fn offset_of(&self, ptr: NonNull<u8>, size: usize) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.base() as usize)?;
        (offset < N || (size == 0 && offset == N)).then_some(offset)
    }
}

impl<const N: usize, F: RawAllocator> RawAllocator for FixedCapacityArena<N, F> {
    #[inline]
    fn try_allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        FixedCapacityArena::try_allocate(self, size)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: forwarded contract.
        unsafe { FixedCapacityArena::deallocate(self, ptr, size) }
    }
}

impl<const N: usize, F: RawAllocator> fmt::Debug for FixedCapacityArena<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedCapacityArena")
            .field("capacity", &N)
            .field("used", &self.used())
            .field("fallback_allocations", &self.fallback_allocations.get())
            .field("stranded_bytes", &self.stranded_bytes.get())
            .finish_non_exhaustive()
    }
}
