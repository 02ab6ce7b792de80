//! # STACKPOOL Demo
//!
//! Replays the user pool walkthrough against [`stackpool_core`] and measures
//! the arena against the system allocator.
//!
//! ## Example
//!
//! ```rust
//! use stackpool_demo::{run_scenario, DemoConfig};
//!
//! let report = run_scenario(&DemoConfig::default());
//! assert_eq!(report.heap_after_array, 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cli;
pub mod config;
pub mod scenario;

pub use cli::CliArgs;
pub use config::{ConfigError, DemoConfig};
pub use scenario::{run_benchmark, run_scenario, BenchmarkReport, ScenarioReport, User, UserPool};
