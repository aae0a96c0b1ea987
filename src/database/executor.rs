//! Query Executor
//!
//! Runs an arbitrary SQL string inside a transaction and reports the result
//! as a [`QueryOutcome`]. Statements that produce a result set are fully
//! materialized; every cell is rendered to text.

use crate::error::Result;
use sqlx::mysql::{MySqlDatabaseError, MySqlPool, MySqlRow};
use sqlx::{Column, Executor, MySql, Row, Statement, TypeInfo, ValueRef};
use std::fmt::Display;
use tracing::{debug, warn};

/// Result of running one statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The statement produced a result set (possibly with zero rows)
    Rows {
        columns: Vec<String>,
        /// One entry per row; `None` is SQL NULL
        rows: Vec<Vec<Option<String>>>,
    },
    /// The statement ran without producing a result set
    Executed { rows_affected: u64 },
    /// The statement failed; nothing was committed
    Failed(String),
}

impl QueryOutcome {
    /// Number of rows in the result set, if there is one
    pub fn row_count(&self) -> Option<usize> {
        match self {
            QueryOutcome::Rows { rows, .. } => Some(rows.len()),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }
}

/// Run a statement, converting any error into [`QueryOutcome::Failed`]
pub async fn run_query(pool: &MySqlPool, sql: &str) -> QueryOutcome {
    match execute(pool, sql).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "query failed");
            QueryOutcome::Failed(e.to_string())
        }
    }
}

/// Run a statement inside a transaction
///
/// The statement is prepared first; its column list tells whether it yields
/// a result set. Statements the server refuses to prepare (stored routine
/// and trigger definitions, `LOCK TABLES`, ...) are sent as plain text
/// instead and reported as [`QueryOutcome::Executed`]. The transaction is
/// committed on success and rolled back when dropped on any error.
pub async fn execute(pool: &MySqlPool, sql: &str) -> Result<QueryOutcome> {
    let mut tx = pool.begin().await?;

    let statement = match (&mut *tx).prepare(sql).await {
        Ok(statement) => statement,
        Err(e) if is_unpreparable(&e) => {
            debug!("statement cannot be prepared, sending it as text");
            // No arguments: sqlx uses the text protocol
            let result = (&mut *tx).execute(sql).await?;
            tx.commit().await?;
            return Ok(QueryOutcome::Executed {
                rows_affected: result.rows_affected(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let outcome = if columns.is_empty() {
        let result = statement.query().execute(&mut *tx).await?;
        debug!(rows_affected = result.rows_affected(), "statement executed");
        QueryOutcome::Executed {
            rows_affected: result.rows_affected(),
        }
    } else {
        let rows = statement.query().fetch_all(&mut *tx).await?;
        debug!(rows = rows.len(), columns = columns.len(), "result set fetched");
        QueryOutcome::Rows {
            columns,
            rows: rows.iter().map(render_row).collect(),
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

/// MySQL `ER_UNSUPPORTED_PS`
const ER_UNSUPPORTED_PS: u16 = 1295;

/// The server rejected the statement for the prepared-statement protocol
fn is_unpreparable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == ER_UNSUPPORTED_PS),
        _ => false,
    }
}

/// How a MySQL column type is decoded for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Signed,
    Unsigned,
    Float,
    Decimal,
    Date,
    DateTime,
    Time,
    Binary,
    Text,
}

impl CellKind {
    /// Map a driver type name (e.g. `BIGINT UNSIGNED`, `DATETIME`) to a kind
    pub fn from_type_name(name: &str) -> Self {
        let name = name.to_uppercase();
        let base = name.split_whitespace().next().unwrap_or("");

        match base {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT"
                if name.ends_with("UNSIGNED") =>
            {
                CellKind::Unsigned
            }
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
                CellKind::Signed
            }
            "FLOAT" | "DOUBLE" | "REAL" => CellKind::Float,
            "DECIMAL" | "NUMERIC" => CellKind::Decimal,
            "DATE" => CellKind::Date,
            "DATETIME" | "TIMESTAMP" => CellKind::DateTime,
            "TIME" => CellKind::Time,
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => CellKind::Binary,
            _ => CellKind::Text,
        }
    }
}

fn render_row(row: &MySqlRow) -> Vec<Option<String>> {
    (0..row.len()).map(|index| render_cell(row, index)).collect()
}

/// Render one cell to text; `None` for SQL NULL
fn render_cell(row: &MySqlRow, index: usize) -> Option<String> {
    match row.try_get_raw(index) {
        Ok(value) if value.is_null() => return None,
        Ok(_) => {}
        Err(e) => return Some(format!("<error: {}>", e)),
    }

    let type_name = row.column(index).type_info().name();
    let rendered = match CellKind::from_type_name(type_name) {
        CellKind::Signed => decode::<i64>(row, index),
        CellKind::Unsigned => decode::<u64>(row, index),
        CellKind::Float => decode::<f64>(row, index),
        CellKind::Date => decode::<chrono::NaiveDate>(row, index),
        CellKind::DateTime => decode::<chrono::NaiveDateTime>(row, index),
        CellKind::Time => decode::<chrono::NaiveTime>(row, index),
        CellKind::Binary => decode_bytes(row, index),
        // DECIMAL travels as text on the wire
        CellKind::Decimal | CellKind::Text => decode::<String>(row, index),
    };

    Some(
        rendered
            .or_else(|| decode_unchecked(row, index))
            .unwrap_or_else(|| format!("<unsupported {}>", type_name)),
    )
}

fn decode<T>(row: &MySqlRow, index: usize) -> Option<String>
where
    T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql> + Display,
{
    row.try_get::<T, _>(index).ok().map(|v| v.to_string())
}

fn decode_bytes(row: &MySqlRow, index: usize) -> Option<String> {
    row.try_get::<Vec<u8>, _>(index)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_unchecked(row: &MySqlRow, index: usize) -> Option<String> {
    row.try_get_unchecked::<String, _>(index)
        .ok()
        .or_else(|| {
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .ok()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
}
