//! text-to-sql library
//!
//! Ask questions about a MySQL database in plain language: the schema is
//! introspected, a Gemini model writes the SQL and the result is printed.
//! The binary is in src/main.rs.

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod logging;
