//! Schema Indexer
//!
//! Queries the MySQL system catalogs and builds a [`SchemaIndex`] holding
//! every table and view of the current database with its column names.

use crate::database::schema::{SchemaIndex, Table};
use crate::error::Result;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::debug;

// information_schema columns come back as binary strings on some MySQL 8
// builds, so every name is cast to CHAR.
const TABLES_QUERY: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR) AS table_name
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_TYPE IN ('BASE TABLE', 'VIEW')
    ORDER BY TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(COLUMN_NAME AS CHAR) AS column_name
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

/// List the databases visible to the connected user
pub async fn list_databases(pool: &MySqlPool) -> Result<Vec<String>> {
    let rows = sqlx::query("SHOW DATABASES").fetch_all(pool).await?;
    rows.iter().map(|row| text_column(row, 0)).collect()
}

/// Index MySQL database schema
pub async fn index_mysql(pool: &MySqlPool) -> Result<SchemaIndex> {
    let mut schema_index = SchemaIndex::new();

    let db_row: Option<(Option<String>,)> = sqlx::query_as("SELECT CAST(DATABASE() AS CHAR)")
        .fetch_optional(pool)
        .await?;
    schema_index.database_name = db_row.and_then(|(name,)| name);

    let table_rows = sqlx::query(TABLES_QUERY).fetch_all(pool).await?;
    for row in &table_rows {
        schema_index.add_table(Table::new(text_column(row, 0)?));
    }

    let column_rows = sqlx::query(COLUMNS_QUERY).fetch_all(pool).await?;
    let pairs = column_rows
        .iter()
        .map(|row| -> Result<(String, String)> {
            Ok((text_column(row, 0)?, text_column(row, 1)?))
        })
        .collect::<Result<Vec<_>>>()?;
    attach_columns(&mut schema_index, pairs);

    debug!(
        database = ?schema_index.database_name,
        tables = schema_index.len(),
        columns = schema_index.column_count(),
        "indexed schema"
    );

    Ok(schema_index)
}

/// Append `(table, column)` pairs to their tables, ignoring unknown tables
fn attach_columns(index: &mut SchemaIndex, pairs: Vec<(String, String)>) {
    for (table_name, column_name) in pairs {
        if let Some(table) = index.tables.iter_mut().find(|t| t.name == table_name) {
            table.add_column(column_name);
        }
    }
}

/// Decode a textual column, accepting binary strings as lossy UTF-8
fn text_column(row: &MySqlRow, index: usize) -> Result<String> {
    match row.try_get::<String, _>(index) {
        Ok(value) => Ok(value),
        Err(_) => {
            let bytes: Vec<u8> = row.try_get(index)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}
