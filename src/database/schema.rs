//! Schema data structures
//!
//! This module defines the in-memory representation of a database schema:
//! the tables of one database and their column names, in the order the
//! server reported them.

use std::fmt;

/// Represents a database table or view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table or view name
    pub name: String,
    /// Column names, in ordinal order
    pub columns: Vec<String>,
}

impl Table {
    /// Create a new table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Create a table with its columns
    pub fn with_columns<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: impl Into<String>) {
        self.columns.push(column.into());
    }

    /// Format the table as a single prompt line: `name (col1, col2)`
    pub fn format_line(&self) -> String {
        format!("{} ({})", self.name, self.columns.join(", "))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_line())
    }
}

/// Complete database schema index
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    /// Database name (if available)
    pub database_name: Option<String>,
    /// Tables and views in the order they were reported
    pub tables: Vec<Table>,
}

impl SchemaIndex {
    /// Create a new schema index
    pub fn new() -> Self {
        Self {
            database_name: None,
            tables: Vec::new(),
        }
    }

    /// Build an index from `(table, columns)` pairs, keeping their order
    pub fn from_tables<I, T, C, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for (name, columns) in tables {
            index.add_table(Table::with_columns(name, columns));
        }
        index
    }

    /// Add a table to the index, replacing an existing table of the same name
    pub fn add_table(&mut self, table: Table) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Get all table names
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Total number of columns across all tables
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Format the schema for the prompt: one `Table (col1, col2)` line per table
    pub fn format_for_llm(&self) -> String {
        let mut result = String::new();
        for table in &self.tables {
            result.push_str(&table.format_line());
            result.push('\n');
        }
        result
    }
}

impl Default for SchemaIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SchemaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_for_llm())
    }
}
