//! Error types for the AniStream CLI

use color_eyre::eyre::Report;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file issues
    #[error("Configuration error: {0}")]
    Config(#[from] anistream_common::ConfigurationError),

    /// API communication errors
    #[error("{0}")]
    Api(#[from] anistream_sdk::ApiError),

    /// Client could not be assembled
    #[error(transparent)]
    Build(#[from] anistream_sdk::BuildError),

    /// Credential persistence
    #[error(transparent)]
    Store(#[from] anistream_sdk::StoreError),

    /// Command needs a signed-in user
    #[error("Not signed in. Run `anistream login` first.")]
    NotSignedIn,

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Internal(Report::new(err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Internal(Report::new(err))
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
