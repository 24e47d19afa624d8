//! Figment-based configuration loading
//!
//! Every config type is layered the same way: serialized defaults, then an
//! optional TOML file, then environment variables under a prefix with `__`
//! separating nested keys (`ANISTREAM_API__BASE_URL`).

use crate::error::ConfigurationError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// Loader for layered configuration
pub trait ConfigLoader<T>: Sized
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Environment variable prefix, including the trailing underscore
    const ENV_PREFIX: &'static str;

    /// File consulted when no explicit path is given
    const DEFAULT_FILE: &'static str;

    /// Load from the given path, or from [`Self::DEFAULT_FILE`] if none
    fn load(path: Option<PathBuf>) -> Result<T, ConfigurationError> {
        let path = path.unwrap_or_else(|| PathBuf::from(Self::DEFAULT_FILE));
        Self::load_from_file(&path)
    }

    /// Load from an explicit file; a missing file only contributes nothing
    fn load_from_file(path: &Path) -> Result<T, ConfigurationError> {
        Figment::from(Serialized::defaults(T::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigurationError::ParseError {
                details: e.to_string(),
            })
    }

    /// Render the defaults as TOML, used by `config example`
    fn generate_example() -> Result<String, ConfigurationError> {
        toml::to_string_pretty(&T::default()).map_err(|e| ConfigurationError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        nested: Nested,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Nested {
        timeout_secs: u64,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                nested: Nested { timeout_secs: 10 },
            }
        }
    }

    impl ConfigLoader<Sample> for Sample {
        const ENV_PREFIX: &'static str = "SAMPLE_";
        const DEFAULT_FILE: &'static str = "sample.toml";
    }

    #[test]
    fn test_defaults_when_file_missing() {
        figment::Jail::expect_with(|_jail| {
            let config = Sample::load(None).unwrap();
            assert_eq!(config, Sample::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sample.toml",
                r#"
                name = "from-file"

                [nested]
                timeout_secs = 30
                "#,
            )?;
            jail.set_env("SAMPLE_NESTED__TIMEOUT_SECS", "45");

            let config = Sample::load(None).unwrap();
            assert_eq!(config.name, "from-file");
            assert_eq!(config.nested.timeout_secs, 45);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_parse_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SAMPLE_NESTED__TIMEOUT_SECS", "soon");

            let err = Sample::load(None).unwrap_err();
            assert!(matches!(err, ConfigurationError::ParseError { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_generate_example_round_trips() {
        let rendered = Sample::generate_example().unwrap();
        let parsed: Sample = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Sample::default());
    }
}
