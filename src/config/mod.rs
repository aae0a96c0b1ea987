//! Configuration module
//!
//! Builds the [`AppConfig`] once at startup from built-in defaults, the
//! optional settings file, a `.env` file and the process environment (in
//! increasing precedence). The resulting struct is passed by reference to
//! the components that need it.

pub mod storage;

use crate::error::{Result, TextToSqlError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use storage::FileConfig;

pub const ENV_DB_USERNAME: &str = "DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_DATABASE: &str = "DB_DATABASE";
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_LLM_TIMEOUT: &str = "LLM_TIMEOUT_SECS";
pub const ENV_ALLOW_WRITES: &str = "TEXT_TO_SQL_ALLOW_WRITES";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// MySQL credentials and connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Database offered as the default choice when selecting a database
    pub default_database: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    /// `host:port` of the server, used in messages and logs
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_database: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("default_database", &self.default_database)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Settings for the remote generation service
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    /// Execute data-modifying statements without asking for confirmation
    pub allow_writes: bool,
}

impl AppConfig {
    /// Load configuration from the settings file, `.env` and the environment
    ///
    /// Fails when the API key is missing so the program stops before the
    /// interactive loop starts.
    pub fn load() -> Result<Self> {
        load_env_file();
        let file = FileConfig::load()?;
        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    /// Build the configuration from a settings file and a variable lookup
    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = DatabaseConfig::default();

        let database = DatabaseConfig {
            username: var(ENV_DB_USERNAME)
                .or(file.database.username)
                .unwrap_or(defaults.username),
            // An empty password is a legitimate value
            password: lookup(ENV_DB_PASSWORD)
                .or(file.database.password)
                .unwrap_or(defaults.password),
            host: var(ENV_DB_HOST)
                .or(file.database.host)
                .unwrap_or(defaults.host),
            port: parse_var(ENV_DB_PORT, var(ENV_DB_PORT))?
                .or(file.database.port)
                .unwrap_or(defaults.port),
            default_database: var(ENV_DB_DATABASE).or(file.database.database),
            max_connections: file
                .database
                .max_connections
                .unwrap_or(defaults.max_connections)
                .max(1),
            connect_timeout_secs: file
                .database
                .connect_timeout_secs
                .unwrap_or(defaults.connect_timeout_secs),
        };

        let api_key = var(ENV_API_KEY)
            .or(file.llm.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TextToSqlError::LLMApiKeyMissing("Gemini".to_string()))?;

        let llm = LlmConfig {
            api_key,
            model: var(ENV_MODEL)
                .or(file.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: var(ENV_API_BASE)
                .or(file.llm.base_url)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_secs: parse_var(ENV_LLM_TIMEOUT, var(ENV_LLM_TIMEOUT))?
                .or(file.llm.timeout_secs)
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
        };

        let allow_writes = match var(ENV_ALLOW_WRITES) {
            Some(value) => parse_flag(ENV_ALLOW_WRITES, &value)?,
            None => file.allow_writes.unwrap_or(false),
        };

        Ok(Self {
            database,
            llm,
            allow_writes,
        })
    }
}

/// Merge `.env` from the working directory (or a parent) into the
/// environment; variables already set are left alone
///
/// Runs before logging starts so `RUST_LOG` can come from the file.
pub fn load_env_file() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// Merge a specific env file into the environment
pub fn load_env_file_from(path: &Path) -> Result<()> {
    dotenv::from_path(path)
        .map_err(|e| TextToSqlError::Config(format!("{}: {}", path.display(), e)))
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| {
                TextToSqlError::Config(format!("{} has an invalid value: {}", name, v))
            })
        })
        .transpose()
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TextToSqlError::Config(format!(
            "{} must be a boolean, got: {}",
            name, value
        ))),
    }
}

/// Mask a secret for display, keeping only its edges when it is long enough
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else if secret.len() > 8 && secret.is_ascii() {
        format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_file_sets_log_filter_variable() {
        let dir = std::env::temp_dir().join(format!("text-to-sql-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "TEXT_TO_SQL_TEST_LOG_FILTER=debug\n").unwrap();

        load_env_file_from(&path).unwrap();
        let value = std::env::var("TEXT_TO_SQL_TEST_LOG_FILTER").ok();
        assert_eq!(value.as_deref(), Some("debug"));
        assert_eq!(crate::logging::env_filter(value.as_deref()).to_string(), "debug");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let result = load_env_file_from(Path::new("/nonexistent/text-to-sql/.env"));
        assert!(matches!(result, Err(TextToSqlError::Config(_))));
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_sources(FileConfig::default(), lookup(&[(ENV_API_KEY, "key")]))
                .unwrap();

        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.username, "root");
        assert_eq!(config.database.password, "");
        assert!(config.database.default_database.is_none());
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.base_url, DEFAULT_API_BASE);
        assert!(!config.allow_writes);
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let result = AppConfig::from_sources(FileConfig::default(), lookup(&[]));
        assert!(matches!(result, Err(TextToSqlError::LLMApiKeyMissing(_))));

        let result =
            AppConfig::from_sources(FileConfig::default(), lookup(&[(ENV_API_KEY, "  ")]));
        assert!(matches!(result, Err(TextToSqlError::LLMApiKeyMissing(_))));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = FileConfig::from_toml_str(
            r#"
            allow_writes = true

            [database]
            host = "file-host"
            port = 3307
            username = "file-user"

            [llm]
            api_key = "file-key"
            model = "file-model"
            "#,
        )
        .unwrap();

        let config = AppConfig::from_sources(
            file,
            lookup(&[
                (ENV_DB_HOST, "env-host"),
                (ENV_DB_PORT, "3310"),
                (ENV_MODEL, "env-model"),
                (ENV_ALLOW_WRITES, "no"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.host, "env-host");
        assert_eq!(config.database.port, 3310);
        assert_eq!(config.database.username, "file-user");
        assert_eq!(config.llm.api_key, "file-key");
        assert_eq!(config.llm.model, "env-model");
        assert!(!config.allow_writes);
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_sources(
            FileConfig::default(),
            lookup(&[(ENV_API_KEY, "key"), (ENV_DB_PORT, "mysql")]),
        );
        assert!(matches!(result, Err(TextToSqlError::Config(_))));
    }

    #[test]
    fn test_invalid_flag() {
        let result = AppConfig::from_sources(
            FileConfig::default(),
            lookup(&[(ENV_API_KEY, "key"), (ENV_ALLOW_WRITES, "maybe")]),
        );
        assert!(matches!(result, Err(TextToSqlError::Config(_))));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret("AIzaSyD-1234567890"), "AIza...7890");
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = AppConfig::from_sources(
            FileConfig::default(),
            lookup(&[(ENV_API_KEY, "AIzaSyD-1234567890"), (ENV_DB_PASSWORD, "hunter2")]),
        )
        .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("AIzaSyD-1234567890"));
        assert!(debug.contains("AIza...7890"));
    }
}
