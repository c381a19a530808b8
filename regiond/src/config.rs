//! Configuration loading for regiond
//!
//! Resolution priority per key: environment variable, then TOML config file,
//! then compiled default. The upstream directory URL has no sane default and
//! must come from one of the first two.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5740";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 86_400; // daily
pub const DEFAULT_SYNC_DEADLINE_SECS: u64 = 120;

/// Configuration loading or validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk TOML shape; every key optional
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    listen_addr: Option<String>,
    database_path: Option<PathBuf>,
    directory_url: Option<String>,
    fetch_timeout_secs: Option<u64>,
    sync_interval_secs: Option<u64>,
    sync_deadline_secs: Option<u64>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct RegiondConfig {
    pub listen_addr: String,
    pub database_path: PathBuf,
    pub directory_url: String,
    pub fetch_timeout_secs: u64,
    pub sync_interval_secs: u64,
    pub sync_deadline_secs: u64,
}

impl RegiondConfig {
    /// Load configuration from the default file location plus environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = match config_file_path() {
            Some(path) if path.exists() => read_toml(&path)?,
            _ => TomlConfig::default(),
        };
        Self::resolve(file)
    }

    fn resolve(file: TomlConfig) -> Result<Self, ConfigError> {
        let directory_url = std::env::var("REGIOND_DIRECTORY_URL")
            .ok()
            .or(file.directory_url)
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "directory_url not configured. Set REGIOND_DIRECTORY_URL or add \
                     directory_url to the config file"
                        .to_string(),
                )
            })?;

        let listen_addr = std::env::var("REGIOND_LISTEN_ADDR")
            .ok()
            .or(file.listen_addr)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let database_path = std::env::var("REGIOND_DATABASE_PATH")
            .ok()
            .map(PathBuf::from)
            .or(file.database_path)
            .unwrap_or_else(default_database_path);

        Ok(Self {
            listen_addr,
            database_path,
            directory_url,
            fetch_timeout_secs: file
                .fetch_timeout_secs
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            sync_interval_secs: file
                .sync_interval_secs
                .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS),
            sync_deadline_secs: file
                .sync_deadline_secs
                .unwrap_or(DEFAULT_SYNC_DEADLINE_SECS),
        })
    }
}

fn read_toml(path: &PathBuf) -> Result<TomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        source: e,
    })
}

/// Config file location: REGIOND_CONFIG, else platform config dir
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("REGIOND_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("regiond").join("config.toml"))
}

/// Default database location: platform data dir
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("regiond"))
        .unwrap_or_else(|| PathBuf::from("./regiond_data"))
        .join("regiond.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_over_minimal_file() {
        let file = TomlConfig {
            directory_url: Some("http://directory.example".to_string()),
            ..Default::default()
        };
        let config = RegiondConfig::resolve(file).unwrap();

        assert_eq!(config.directory_url, "http://directory.example");
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.sync_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);
        assert_eq!(config.sync_deadline_secs, DEFAULT_SYNC_DEADLINE_SECS);
    }

    #[test]
    fn test_missing_directory_url_is_an_error() {
        let result = RegiondConfig::resolve(TomlConfig::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let file: TomlConfig = toml::from_str(
            r#"
            directory_url = "http://directory.example"
            listen_addr = "0.0.0.0:8080"
            fetch_timeout_secs = 5
            sync_interval_secs = 3600
            sync_deadline_secs = 60
            "#,
        )
        .unwrap();
        let config = RegiondConfig::resolve(file).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.fetch_timeout_secs, 5);
        assert_eq!(config.sync_interval_secs, 3600);
        assert_eq!(config.sync_deadline_secs, 60);
    }
}
