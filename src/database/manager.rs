//! Database Manager
//!
//! This module implements the DatabaseManager struct which owns the MySQL
//! connection of the session: it connects to the server, switches to a
//! database, indexes its schema and executes statements.

use crate::config::DatabaseConfig;
use crate::database::connection::{self, ConnectionState};
use crate::database::executor::{self, QueryOutcome};
use crate::database::indexer;
use crate::database::schema::SchemaIndex;
use crate::database::session::DatabaseSession;
use crate::error::{Result, TextToSqlError};
use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use tracing::{info, warn};

/// Database Manager
///
/// Holds the credentials and at most one live connection pool. Each connect
/// call opens a fresh pool and replaces the previous one only once the new
/// pool has answered a round trip.
pub struct DatabaseManager {
    /// Connection settings
    config: DatabaseConfig,
    /// Current connection pool
    pool: Option<MySqlPool>,
    /// What the pool is connected to
    state: ConnectionState,
}

impl DatabaseManager {
    /// Creates a new, unconnected DatabaseManager
    ///
    /// # Example
    /// ```no_run
    /// use text_to_sql::config::DatabaseConfig;
    /// use text_to_sql::database::manager::DatabaseManager;
    /// use text_to_sql::database::DatabaseSession;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut manager = DatabaseManager::new(&DatabaseConfig::default());
    ///     manager.connect_server().await?;
    ///     manager.connect_database("shop").await?;
    ///     println!("{}", manager.get_tables_and_columns().await?);
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
            pool: None,
            state: ConnectionState::Unconnected,
        }
    }

    /// What the manager is currently connected to
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Open a pool for `database` (or the bare server) and swap it in
    async fn reconnect(&mut self, database: Option<&str>) -> Result<()> {
        let target = connection::connection_target(&self.config, database);
        info!(target = %target, user = %self.config.username, "connecting");

        let pool = match connection::open_pool(&self.config, database).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(target = %target, error = %e, "connection failed");
                return Err(e);
            }
        };

        if let Some(old) = self.pool.replace(pool) {
            old.close().await;
        }
        self.state = match database {
            Some(name) => ConnectionState::Database(name.to_string()),
            None => ConnectionState::Server,
        };

        info!(target = %target, "connected");
        Ok(())
    }

    fn require_pool(&self) -> Result<&MySqlPool> {
        self.pool
            .as_ref()
            .ok_or_else(|| TextToSqlError::NotConnected("connect to the server first".to_string()))
    }
}

#[async_trait]
impl DatabaseSession for DatabaseManager {
    async fn connect_server(&mut self) -> Result<()> {
        self.reconnect(None).await
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        let pool = self.require_pool()?;
        let databases = indexer::list_databases(pool).await?;
        info!(count = databases.len(), "listed databases");
        Ok(databases)
    }

    async fn connect_database(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(TextToSqlError::InvalidInput(
                "database name must not be empty".to_string(),
            ));
        }
        self.reconnect(Some(name)).await
    }

    async fn get_tables_and_columns(&self) -> Result<SchemaIndex> {
        let pool = self.require_pool()?;
        if self.state.database().is_none() {
            return Err(TextToSqlError::NotConnected(
                "no database selected".to_string(),
            ));
        }

        let index = indexer::index_mysql(pool).await?;
        info!(
            database = ?index.database_name,
            tables = index.len(),
            "schema loaded"
        );
        Ok(index)
    }

    async fn run_query(&self, sql: &str) -> QueryOutcome {
        match self.require_pool() {
            Ok(pool) => executor::run_query(pool, sql).await,
            Err(e) => {
                warn!(error = %e, "query rejected");
                QueryOutcome::Failed(e.to_string())
            }
        }
    }

    fn default_database(&self) -> Option<&str> {
        self.config.default_database.as_deref()
    }
}
