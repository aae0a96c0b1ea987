//! Database connection handling
//!
//! This module builds MySQL connection options from the configuration and
//! opens verified connection pools, either at server level or scoped to a
//! single database.

use crate::config::DatabaseConfig;
use crate::error::{Result, TextToSqlError};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::fmt;
use std::time::Duration;

/// Where the session's connection currently points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been opened yet
    Unconnected,
    /// Connected to the server without a selected database
    Server,
    /// Connected to a specific database
    Database(String),
}

impl ConnectionState {
    /// Name of the selected database, if any
    pub fn database(&self) -> Option<&str> {
        match self {
            ConnectionState::Database(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Unconnected => write!(f, "not connected"),
            ConnectionState::Server => write!(f, "connected to server"),
            ConnectionState::Database(name) => write!(f, "connected to database '{}'", name),
        }
    }
}

/// Human readable target of a connection attempt, e.g. `localhost:3306/shop`
pub fn connection_target(config: &DatabaseConfig, database: Option<&str>) -> String {
    match database {
        Some(name) => format!("{}/{}", config.server_address(), name),
        None => config.server_address(),
    }
}

/// Build connect options for the server, optionally scoped to `database`
pub fn connect_options(config: &DatabaseConfig, database: Option<&str>) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password);

    match database {
        Some(name) => options.database(name),
        None => options,
    }
}

/// Open a pool and verify it with a round trip
pub async fn open_pool(config: &DatabaseConfig, database: Option<&str>) -> Result<MySqlPool> {
    let target = connection_target(config, database);

    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(connect_options(config, database))
        .await
        .map_err(|e| TextToSqlError::connection(target.clone(), e))?;

    if let Err(e) = test_connection(&pool).await {
        pool.close().await;
        return Err(TextToSqlError::connection(target, e));
    }

    Ok(pool)
}

/// Test the connection
pub async fn test_connection(pool: &MySqlPool) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            host: "db.example".to_string(),
            port: 3307,
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_connection_target() {
        assert_eq!(connection_target(&config(), None), "db.example:3307");
        assert_eq!(connection_target(&config(), Some("shop")), "db.example:3307/shop");
    }

    #[test]
    fn test_connect_options() {
        let options = connect_options(&config(), Some("shop"));
        assert_eq!(options.get_host(), "db.example");
        assert_eq!(options.get_port(), 3307);
        assert_eq!(options.get_username(), "root");
        assert_eq!(options.get_database(), Some("shop"));

        let options = connect_options(&config(), None);
        assert_eq!(options.get_database(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Unconnected.to_string(), "not connected");
        assert_eq!(ConnectionState::Server.to_string(), "connected to server");
        assert_eq!(
            ConnectionState::Database("shop".to_string()).to_string(),
            "connected to database 'shop'"
        );
        assert_eq!(ConnectionState::Database("shop".to_string()).database(), Some("shop"));
        assert_eq!(ConnectionState::Server.database(), None);
    }
}
