//! # Runtime Configuration
//!
//! Engine knobs, with defaults that match the documented behaviour and an
//! environment-variable override.

use std::env;

use hangar_output::DEFAULT_READER_CAPACITY;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Readers need room for at least one line.
    #[error("reader capacity must be at least 1")]
    ZeroReaderCapacity,

    /// An environment variable held something unparsable.
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Lines buffered per output reader before writers block.
    pub reader_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reader_capacity: DEFAULT_READER_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Read overrides from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `HANGAR_READER_CAPACITY`: per-reader queue size (default: 100)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("HANGAR_READER_CAPACITY") {
            config.reader_capacity =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber {
                        key: "HANGAR_READER_CAPACITY",
                        value,
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reader_capacity == 0 {
            return Err(ConfigError::ZeroReaderCapacity);
        }
        Ok(())
    }
}
