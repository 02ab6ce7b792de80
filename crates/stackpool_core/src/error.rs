//! # Memory Error Types
//!
//! All errors that the fallible allocation API can report.
//!
//! Exhaustion of an arena is NOT an error: it is forwarded to the fallback
//! allocator. Only failures of that fallback surface here.

use std::alloc::{handle_alloc_error, Layout};

use thiserror::Error;

/// Errors that can occur while allocating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The request cannot be expressed as a valid layout.
    #[error("size overflow: {size} bytes cannot be allocated")]
    SizeOverflow {
        /// The requested byte count.
        size: usize,
    },

    /// The general-purpose allocator returned null.
    #[error("out of memory: failed to allocate {} bytes", .layout.size())]
    OutOfMemory {
        /// The layout that could not be satisfied.
        layout: Layout,
    },

    /// A typed allocation needs more alignment than any allocator here guarantees.
    #[error("unsupported alignment: {align} exceeds the maximum fundamental alignment")]
    UnsupportedAlignment {
        /// The alignment the type requires.
        align: usize,
    },
}

impl MemoryError {
    /// Turns the error into the fatal behaviour of the infallible API.
    ///
    /// Out-of-memory goes through [`handle_alloc_error`], everything else
    /// panics, mirroring what `Box` and `Vec` do.
    #[cold]
    pub fn raise(self) -> ! {
        match self {
            Self::OutOfMemory { layout } => handle_alloc_error(layout),
            other => panic!("{other}"),
        }
    }
}

/// Result type for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MemoryError::SizeOverflow { size: usize::MAX };
        assert!(err.to_string().contains("size overflow"));

        let layout = Layout::from_size_align(64, 16).unwrap();
        let err = MemoryError::OutOfMemory { layout };
        assert_eq!(err.to_string(), "out of memory: failed to allocate 64 bytes");

        let err = MemoryError::UnsupportedAlignment { align: 64 };
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn test_raise_panics_on_overflow() {
        let result = std::panic::catch_unwind(|| {
            MemoryError::SizeOverflow { size: 7 }.raise();
        });
        assert!(result.is_err());
    }
}
