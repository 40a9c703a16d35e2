//! # Core Error Types
//!
//! The core deliberately has almost no recoverable errors: dead-handle use
//! is a contract violation caught by debug assertions, and allocation
//! failure aborts. What remains is configuration parsing.

use thiserror::Error;

/// Errors that can occur while loading a [`crate::CoreConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML document failed to parse or contained unknown fields.
    #[error("invalid core config: {0}")]
    Parse(#[from] toml::de::Error),
}
