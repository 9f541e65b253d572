//! Client configuration.
//!
//! The only setting is the service base URL. It is resolved from, in order,
//! the command line, the `PHARMAGPT_BASE_URL` environment variable, the JSON
//! file at `<config_dir>/pharmagpt/config.json`, and finally the default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "PHARMAGPT_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Where the effective base URL came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    File,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub source: ConfigSource,
}

impl Config {
    /// Load from the user config directory; a missing file yields defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pharmagpt").join("config.json"))
    }

    /// Pick the effective base URL. Blank values at any level are skipped.
    pub fn resolve(&self, cli: Option<&str>, env: Option<&str>) -> ResolvedConfig {
        let candidates = [
            (cli, ConfigSource::Cli),
            (env, ConfigSource::Env),
            (self.base_url.as_deref(), ConfigSource::File),
        ];

        let (base_url, source) = candidates
            .into_iter()
            .find_map(|(value, source)| {
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (v.to_string(), source))
            })
            .unwrap_or_else(|| (DEFAULT_BASE_URL.to_string(), ConfigSource::Default));

        let resolved = ResolvedConfig {
            base_url: normalize_base_url(&base_url),
            source,
        };
        tracing::info!(base_url = %resolved.base_url, source = %resolved.source, "resolved service base URL");
        resolved
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"base_url": "http://pharma.internal:9000/"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        let resolved = config.resolve(None, None);
        assert_eq!(resolved.base_url, "http://pharma.internal:9000");
        assert_eq!(resolved.source, ConfigSource::File);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_precedence_cli_env_file_default() {
        let config = Config {
            base_url: Some("http://file:1".to_string()),
        };
        assert_eq!(
            config.resolve(Some("http://cli:1"), Some("http://env:1")).source,
            ConfigSource::Cli
        );
        assert_eq!(
            config.resolve(None, Some("http://env:1")).source,
            ConfigSource::Env
        );
        assert_eq!(config.resolve(Some("  "), None).source, ConfigSource::File);

        let resolved = Config::default().resolve(None, None);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.source, ConfigSource::Default);
    }
}
