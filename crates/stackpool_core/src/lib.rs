//! # STACKPOOL Core
//!
//! A fixed-capacity bump-pointer memory pool that falls back to the
//! general-purpose allocator when it runs out, designed for:
//! - Scoped bursts of small, same-lifetime allocations
//! - Zero heap traffic while the pool has room
//! - O(1) allocate, release and reset
//!
//! ## Architecture Rules
//!
//! 1. **Allocators are injected** - types take a [`RawAllocator`], nothing hooks global allocation
//! 2. **Exhaustion is not an error** - full pools forward to their fallback
//! 3. **Stack-ordered release** - only the newest allocation is reclaimed, the rest waits for `reset`
//!
//! ## Example
//!
//! ```rust
//! use stackpool_core::{ArenaBox, FixedCapacityArena};
//!
//! let pool = FixedCapacityArena::<1024>::new();
//! let user = ArenaBox::new_in((42u32, "ada"), &pool);
//! assert_eq!(user.0, 42);
//! assert!(pool.used() > 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;
pub mod timer;

pub use error::{MemoryError, MemoryResult};
pub use memory::{
    align_up, AllocationSnapshot, ArenaArray, ArenaBox, ArenaStats, CountingAllocator,
    FixedCapacityArena, RawAllocator, SystemAllocator, MAX_ALIGN,
};
pub use timer::ScopedTimer;
