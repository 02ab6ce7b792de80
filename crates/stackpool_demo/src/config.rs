//! # Demo Configuration
//!
//! Tunables for the scenario and benchmark, loaded once from TOML.
//!
//! ```toml
//! user_count = 10
//! benchmark_rounds = 10000
//! request_size = 24
//! ```

use std::mem;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenario::User;

/// Largest pooled user array the scenario will build, in bytes.
pub const MAX_USER_BYTES: usize = 16 << 20;

/// Largest single benchmark request, in bytes.
pub const MAX_REQUEST_SIZE: usize = 16 << 20;

/// Errors raised while loading a [`DemoConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Scenario and benchmark parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Users placed in the pooled array.
    pub user_count: usize,
    /// Allocate/release pairs per benchmark run.
    pub benchmark_rounds: usize,
    /// Bytes per benchmark request.
    pub request_size: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            user_count: 10,
            benchmark_rounds: 10_000,
            request_size: 24,
        }
    }
}

impl DemoConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks that every value is non-zero and that the user array and
    /// benchmark requests stay within [`MAX_USER_BYTES`] and
    /// [`MAX_REQUEST_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_count == 0 {
            return Err(ConfigError::Invalid("user_count must be greater than zero".into()));
        }
        let user_bytes = self.user_count.checked_mul(mem::size_of::<User>());
        if !user_bytes.is_some_and(|bytes| bytes <= MAX_USER_BYTES) {
            return Err(ConfigError::Invalid(format!(
                "user_count must be at most {}",
                MAX_USER_BYTES / mem::size_of::<User>()
            )));
        }
        if self.benchmark_rounds == 0 {
            return Err(ConfigError::Invalid("benchmark_rounds must be greater than zero".into()));
        }
        if self.request_size == 0 {
            return Err(ConfigError::Invalid("request_size must be greater than zero".into()));
        }
        if self.request_size > MAX_REQUEST_SIZE {
            return Err(ConfigError::Invalid(format!(
                "request_size must be at most {MAX_REQUEST_SIZE} bytes"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_document() {
        let config = DemoConfig::from_toml_str("").unwrap();
        assert_eq!(config, DemoConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = DemoConfig::from_toml_str("user_count = 100\n").unwrap();
        assert_eq!(config.user_count, 100);
        assert_eq!(config.request_size, 24);
    }

    #[test]
    fn test_rejects_zero() {
        let err = DemoConfig::from_toml_str("benchmark_rounds = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("benchmark_rounds")));
    }

    #[test]
    fn test_rejects_oversized_user_count() {
        let largest = MAX_USER_BYTES / mem::size_of::<User>();
        let at_limit = DemoConfig {
            user_count: largest,
            ..DemoConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        for user_count in [largest + 1, usize::MAX / 16 + 1, usize::MAX] {
            let config = DemoConfig {
                user_count,
                ..DemoConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("user_count")));
        }
    }

    #[test]
    fn test_rejects_oversized_request() {
        let err = DemoConfig::from_toml_str(&format!("request_size = {}", MAX_REQUEST_SIZE + 1)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("request_size")));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = DemoConfig::from_toml_str("pool_bytes = 4096").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = DemoConfig::load("/nonexistent/stackpool_demo.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("stackpool_demo_{}.toml", std::process::id()));
        std::fs::write(&path, "user_count = 3\nrequest_size = 8\n").unwrap();
        let config = DemoConfig::load(&path).unwrap();
        assert_eq!(config.user_count, 3);
        assert_eq!(config.request_size, 8);
        std::fs::remove_file(&path).ok();
    }
}
