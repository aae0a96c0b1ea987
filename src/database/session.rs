//! Database session trait
//!
//! The interactive controller talks to the database through this trait so
//! it can be driven by the MySQL-backed [`DatabaseManager`] or by an
//! in-memory session in tests.
//!
//! [`DatabaseManager`]: crate::database::manager::DatabaseManager

use crate::database::executor::QueryOutcome;
use crate::database::schema::SchemaIndex;
use crate::error::Result;
use async_trait::async_trait;

/// Operations the controller needs from a database connection
#[async_trait]
pub trait DatabaseSession: Send + Sync {
    /// Connect to the server without selecting a database
    ///
    /// On failure the previous connection, if any, is kept.
    async fn connect_server(&mut self) -> Result<()>;

    /// List the databases visible to the configured credentials
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// Reconnect scoped to `name`
    async fn connect_database(&mut self, name: &str) -> Result<()>;

    /// Enumerate every table of the selected database with its column names
    async fn get_tables_and_columns(&self) -> Result<SchemaIndex>;

    /// Execute a statement transactionally; errors become [`QueryOutcome::Failed`]
    async fn run_query(&self, sql: &str) -> QueryOutcome;

    /// Database offered as the default selection, if configured
    fn default_database(&self) -> Option<&str> {
        None
    }
}
