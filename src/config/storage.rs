//! Configuration Storage
//!
//! This module reads the optional settings file. Every key is optional;
//! values from the environment take precedence over the file.

use crate::error::{Result, TextToSqlError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Application directory under the platform configuration directory
const APP_DIR: &str = "text-to-sql";

/// Persistent configuration data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Database connection settings
    pub database: DatabaseSection,
    /// Generation service settings
    pub llm: LlmSection,
    /// Execute data-modifying statements without confirmation
    pub allow_writes: Option<bool>,
}

/// `[database]` table of the settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database offered as the default choice after connecting
    pub database: Option<String>,
    pub max_connections: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
}

/// `[llm]` table of the settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Get the configuration file path, if the platform has a config directory
    pub fn config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from the default location
    ///
    /// A missing file (or a platform without a config directory) yields the
    /// empty configuration.
    pub fn load() -> Result<Self> {
        match Self::config_file() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TextToSqlError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            TextToSqlError::Config(msg) => {
                TextToSqlError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TextToSqlError::Config(format!("Failed to parse config file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.database.host.is_none());
        assert!(config.llm.model.is_none());
        assert!(config.allow_writes.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = FileConfig::from_toml_str(
            r#"
            allow_writes = true

            [database]
            host = "db.internal"
            port = 3307

            [llm]
            model = "gemini-1.5-pro"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.host.as_deref(), Some("db.internal"));
        assert_eq!(config.database.port, Some(3307));
        assert!(config.database.username.is_none());
        assert_eq!(config.llm.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.allow_writes, Some(true));
    }

    #[test]
    fn test_invalid_file() {
        let result = FileConfig::from_toml_str("[database]\nport = \"not a port\"");
        assert!(matches!(result, Err(TextToSqlError::Config(_))));
    }

    #[test]
    fn test_missing_path() {
        let result = FileConfig::load_from(Path::new("/nonexistent/text-to-sql/config.toml"));
        assert!(result.is_err());
    }
}
