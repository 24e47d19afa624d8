//! Error types shared across AniStream crates

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration sources could not be merged or deserialized
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// A value was present but not acceptable
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
