//! # Allocator-Injected Owners
//!
//! `Box`-like owners whose memory comes from an allocator passed in at
//! construction. This is how a type routes its own allocations through a
//! shared arena.

// SAFETY: These owners manage initialization and destruction of values placed
// in raw allocator memory.
#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use super::raw::RawAllocator;
use super::MAX_ALIGN;
use crate::error::{MemoryError, MemoryResult};

fn check_alignment<T>() -> MemoryResult<()> {
    let align = mem::align_of::<T>();
    if align > MAX_ALIGN {
        return Err(MemoryError::UnsupportedAlignment { align });
    }
    Ok(())
}

/// A single `T` owned in memory from `A`.
///
/// Dropping the box drops the value and releases `size_of::<T>()` bytes back
/// to `A`. Because it borrows the allocator, the allocator cannot move while
/// the box lives.
///
/// # Example
///
/// ```rust
/// use stackpool_core::{ArenaBox, FixedCapacityArena};
///
/// let arena = FixedCapacityArena::<256>::new();
/// {
///     let mut value = ArenaBox::new_in([1u32, 2, 3], &arena);
///     value[0] = 10;
///     assert_eq!(*value, [10, 2, 3]);
///     assert_eq!(arena.used(), 16);
/// }
/// assert_eq!(arena.used(), 0);
/// ```
pub struct ArenaBox<'a, T, A: RawAllocator + ?Sized> {
    ptr: NonNull<T>,
    alloc: &'a A,
    _owns: PhantomData<T>,
}

impl<'a, T, A: RawAllocator + ?Sized> ArenaBox<'a, T, A> {
    /// Moves `value` into memory from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::UnsupportedAlignment`] for over-aligned types and
    /// propagates allocator failures.
    pub fn try_new_in(value: T, alloc: &'a A) -> MemoryResult<Self> {
        check_alignment::<T>()?;
        let ptr = alloc.try_allocate(mem::size_of::<T>())?.cast::<T>();
        // SAFETY: freshly allocated, aligned to MAX_ALIGN >= align_of::<T>(),
        // and at least size_of::<T>() bytes.
        unsafe { ptr.as_ptr().write(value) };
        Ok(Self {
            ptr,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Moves `value` into memory from `alloc`. Failure is fatal.
    pub fn new_in(value: T, alloc: &'a A) -> Self {
        match Self::try_new_in(value, alloc) {
            Ok(boxed) => boxed,
            Err(err) => err.raise(),
        }
    }

    /// Allocates an all-zero `T`.
    pub fn zeroed_in(alloc: &'a A) -> Self
    where
        T: bytemuck::Zeroable,
    {
        Self::new_in(T::zeroed(), alloc)
    }

    /// The allocator this box releases into.
    #[inline]
    #[must_use]
    pub fn allocator(this: &Self) -> &'a A {
        this.alloc
    }

    /// Moves the value out and releases the memory.
    #[must_use]
    pub fn into_inner(this: Self) -> T {
        let this = ManuallyDrop::new(this);
        // SAFETY: the value is initialized and is read exactly once; the
        // owner is not dropped, so it will not be dropped again.
        let value = unsafe { this.ptr.as_ptr().read() };
        // SAFETY: allocated from `alloc` with this size in `try_new_in`.
        unsafe { this.alloc.deallocate(this.ptr.cast::<u8>(), mem::size_of::<T>()) };
        value
    }
}

impl<T, A: RawAllocator + ?Sized> Deref for ArenaBox<'_, T, A> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: initialized for the box's whole life.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, A: RawAllocator + ?Sized> DerefMut for ArenaBox<'_, T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: initialized and uniquely owned.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T, A: RawAllocator + ?Sized> Drop for ArenaBox<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: the value is initialized and dropped once; the memory came
        // from `alloc` with this size.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.alloc.deallocate(self.ptr.cast::<u8>(), mem::size_of::<T>());
        }
    }
}

impl<T: fmt::Debug, A: RawAllocator + ?Sized> fmt::Debug for ArenaBox<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// A fixed-length run of `T` owned in memory from `A`.
///
/// The whole run is one allocation of `len * size_of::<T>()` bytes.
pub struct ArenaArray<'a, T, A: RawAllocator + ?Sized> {
    ptr: NonNull<T>,
    len: usize,
    alloc: &'a A,
    _owns: PhantomData<T>,
}

/// Drops the initialized prefix and releases the block if construction unwinds.
struct PartialInit<'g, T, A: RawAllocator + ?Sized> {
    ptr: NonNull<T>,
    initialized: usize,
    bytes: usize,
    alloc: &'g A,
}

impl<T, A: RawAllocator + ?Sized> Drop for PartialInit<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: exactly `initialized` leading elements were written, and the
        // block came from `alloc` with `bytes`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.initialized));
            self.alloc.deallocate(self.ptr.cast::<u8>(), self.bytes);
        }
    }
}

impl<'a, T, A: RawAllocator + ?Sized> ArenaArray<'a, T, A> {
    /// Builds `len` elements with `f(index)` in memory from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::SizeOverflow`] if the total size overflows,
    /// [`MemoryError::UnsupportedAlignment`] for over-aligned types, and
    /// propagates allocator failures.
    pub fn try_from_fn_in(len: usize, mut f: impl FnMut(usize) -> T, alloc: &'a A) -> MemoryResult<Self> {
        check_alignment::<T>()?;
        let bytes = mem::size_of::<T>()
            .checked_mul(len)
            .ok_or(MemoryError::SizeOverflow { size: usize::MAX })?;
        let ptr = alloc.try_allocate(bytes)?.cast::<T>();

        let mut guard = PartialInit {
            ptr,
            initialized: 0,
            bytes,
            alloc,
        };
        while guard.initialized < len {
            let value = f(guard.initialized);
            // SAFETY: index < len, inside the block, aligned as checked above.
            unsafe { ptr.as_ptr().add(guard.initialized).write(value) };
            guard.initialized += 1;
        }
        mem::forget(guard);

        Ok(Self {
            ptr,
            len,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Builds `len` elements with `f(index)`. Failure is fatal.
    pub fn from_fn_in(len: usize, f: impl FnMut(usize) -> T, alloc: &'a A) -> Self {
        match Self::try_from_fn_in(len, f, alloc) {
            Ok(array) => array,
            Err(err) => err.raise(),
        }
    }

    /// Number of bytes this array occupies in its allocator.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len * mem::size_of::<T>()
    }
}

impl<T, A: RawAllocator + ?Sized> Deref for ArenaArray<'_, T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: `len` initialized elements for the array's whole life.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: RawAllocator + ?Sized> DerefMut for ArenaArray<'_, T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: `len` initialized elements, uniquely owned.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: RawAllocator + ?Sized> Drop for ArenaArray<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: elements are initialized and dropped once; the block came
        // from `alloc` with `byte_len()` bytes.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
            self.alloc.deallocate(self.ptr.cast::<u8>(), self.byte_len());
        }
    }
}

impl<T: fmt::Debug, A: RawAllocator + ?Sized> fmt::Debug for ArenaArray<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
