//! Database module
//!
//! This module provides MySQL connection management, schema indexing,
//! statement classification and query execution.

pub mod connection;
pub mod executor;
pub mod guard;
pub mod indexer;
pub mod manager;
pub mod schema;
pub mod session;

// Re-exports
pub use connection::ConnectionState;
pub use executor::QueryOutcome;
pub use guard::StatementKind;
pub use manager::DatabaseManager;
pub use schema::{SchemaIndex, Table};
pub use session::DatabaseSession;
