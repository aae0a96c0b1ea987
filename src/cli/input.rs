//! Line input
//!
//! The controller reads every answer through [`LineReader`]. The terminal
//! implementation uses `rustyline`; a `VecDeque<String>` serves as a scripted
//! reader.

use crate::error::{Result, TextToSqlError};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of operator input
pub trait LineReader {
    /// Show `prompt` and read one line; `Ok(None)` at end of input
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Scripted input: lines are consumed front to back
impl LineReader for VecDeque<String> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.pop_front())
    }
}

/// Terminal line editor with persistent history
pub struct EditorReader {
    /// The rustyline editor
    editor: Editor<(), DefaultHistory>,
    /// Where history is loaded from and saved to
    history_path: PathBuf,
}

impl EditorReader {
    /// Create a new editor and load the history file if present
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let mut editor = Editor::<(), DefaultHistory>::with_config(config).map_err(|e| {
            TextToSqlError::Readline(format!("Failed to initialize editor: {}", e))
        })?;

        let history_path = dirs::home_dir()
            .map(|p| p.join(".text-to-sql").join("history"))
            .unwrap_or_else(|| ".text-to-sql-history".into());

        if let Err(e) = editor.load_history(&history_path) {
            // History file doesn't exist yet on first run
            debug!(path = %history_path.display(), error = %e, "history not loaded");
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Write the history file; failures are logged and otherwise ignored
    pub fn save_history(&mut self) {
        ensure_parent_dir(&self.history_path);
        if let Err(e) = self.editor.save_history(&self.history_path) {
            debug!(path = %self.history_path.display(), error = %e, "history not saved");
        }
    }
}

/// Create the directory holding `path`; `false` (logged) when that fails
fn ensure_parent_dir(path: &Path) -> bool {
    match path.parent() {
        Some(parent) => match std::fs::create_dir_all(parent) {
            Ok(()) => true,
            Err(e) => {
                debug!(path = %parent.display(), error = %e, "history directory not created");
                false
            }
        },
        None => true,
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C abandons the current answer
                println!("^C");
                Ok(Some(String::new()))
            }
            Err(ReadlineError::Eof) => {
                println!();
                Ok(None)
            }
            Err(err) => Err(TextToSqlError::Readline(err.to_string())),
        }
    }
}
