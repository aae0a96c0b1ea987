//! CLI module
//!
//! This module provides the menu-driven interface: the controller, menu
//! parsing, line input and result rendering.

pub mod app;
pub mod input;
pub mod menu;
pub mod render;

// Re-exports
pub use app::{App, SessionState};
pub use input::{EditorReader, LineReader};
