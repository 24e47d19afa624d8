//! Client configuration
//!
//! Layered as defaults → `anistream.toml` → `ANISTREAM_*` environment
//! variables (`ANISTREAM_API__TIMEOUT_SECS=5`). The flat
//! `ANISTREAM_API_BASE_URL` and `ANISTREAM_API_URL` variables are honoured
//! last, in that order, for the base URL.

use anistream_common::{ConfigLoader, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default API URL when not specified
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const BASE_URL_ENV_VARS: &[&str] = &["ANISTREAM_API_BASE_URL", "ANISTREAM_API_URL"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the AniStream API
    pub base_url: String,

    /// Whole-request deadline in seconds
    pub timeout_secs: u64,

    /// Connection establishment deadline in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Where credentials are persisted; the platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Main configuration structure for the AniStream client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl ClientConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut config = match config_path {
            Some(path) => <ClientConfig as ConfigLoader<ClientConfig>>::load_from_file(path)?,
            None => <ClientConfig as ConfigLoader<ClientConfig>>::load(None)?,
        };

        if let Some(base_url) = BASE_URL_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
        {
            config.api.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        url::Url::parse(&self.api.base_url).map_err(|e| ConfigurationError::InvalidValue {
            key: "api.base_url".to_string(),
            reason: e.to_string(),
        })?;

        if self.api.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                key: "api.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.api.connect_timeout_secs.map(Duration::from_secs)
    }
}

impl ConfigLoader<ClientConfig> for ClientConfig {
    const ENV_PREFIX: &'static str = "ANISTREAM_";
    const DEFAULT_FILE: &'static str = "anistream.toml";
}
