//! # Memory Management
//!
//! A fixed-capacity arena that falls back to the general-purpose allocator,
//! plus the allocator capability every type here is built around.
//!
//! ## Design Philosophy
//!
//! Memory for a burst of short-lived objects is reserved once. While the
//! reservation has room:
//! - No heap allocations
//! - O(1) bump allocation
//! - Stack-ordered release gives the space back
//!
//! When it runs out, requests go to the fallback allocator instead of failing.

mod arena;
mod boxed;
mod counting;
mod raw;

pub use arena::{ArenaStats, FixedCapacityArena};
pub use boxed::{ArenaArray, ArenaBox};
pub use counting::{AllocationSnapshot, CountingAllocator};
pub use raw::{RawAllocator, SystemAllocator};

/// Maximum fundamental alignment, in bytes.
///
/// Every pointer handed out by any allocator in this module is aligned to it.
pub const MAX_ALIGN: usize = 16;

const _: () = {
    assert!(MAX_ALIGN.is_power_of_two());
    assert!(MAX_ALIGN >= std::mem::align_of::<u128>());
    assert!(MAX_ALIGN >= std::mem::align_of::<f64>());
    assert!(MAX_ALIGN >= std::mem::align_of::<u64>());
    assert!(MAX_ALIGN >= std::mem::align_of::<usize>());
};

/// Rounds `size` up to the next multiple of [`MAX_ALIGN`].
///
/// Returns `None` if the rounded value does not fit in a `usize`.
#[inline]
#[must_use]
pub const fn align_up(size: usize) -> Option<usize> {
    match size.checked_add(MAX_ALIGN - 1) {
        Some(padded) => Some(padded & !(MAX_ALIGN - 1)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), Some(0));
        assert_eq!(align_up(1), Some(16));
        assert_eq!(align_up(16), Some(16));
        assert_eq!(align_up(17), Some(32));
        assert_eq!(align_up(usize::MAX - 10), None);
    }
}
