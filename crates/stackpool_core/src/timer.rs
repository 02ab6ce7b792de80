//! # Scoped Timer
//!
//! Measures how long a scope takes and reports it when the scope ends.
//!
//! `Instant` is monotonic, so durations never go negative even if the wall
//! clock is adjusted mid-measurement.

use std::time::{Duration, Instant};

/// Reports the time between its creation and its drop.
///
/// On drop it emits a `tracing` event at INFO level with the scope label and
/// the elapsed microseconds.
///
/// # Example
///
/// ```rust
/// use stackpool_core::ScopedTimer;
///
/// let timer = ScopedTimer::new("load_tables");
/// // ... work ...
/// assert!(timer.elapsed().as_secs() < 60);
/// ```
#[derive(Debug)]
#[must_use = "the timer measures until it is dropped"]
pub struct ScopedTimer {
    label: &'static str,
    start: Instant,
}

impl ScopedTimer {
    /// Starts timing `label`.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    /// The label given at creation.
    #[inline]
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Time since creation.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed_us = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        tracing::info!(scope = self.label, elapsed_us, "scope finished");
    }
}

/// Times the rest of the enclosing scope when the `timing` feature is on.
///
/// Without the feature the macro expands to nothing.
#[cfg(feature = "timing")]
#[macro_export]
macro_rules! measure_scope {
    ($label:expr) => {
        let _scoped_timer = $crate::ScopedTimer::new($label);
    };
}

/// Times the rest of the enclosing scope when the `timing` feature is on.
///
/// Without the feature the macro expands to nothing.
#[cfg(not(feature = "timing"))]
#[macro_export]
macro_rules! measure_scope {
    ($label:expr) => {
        let _ = $label;
    };
}
