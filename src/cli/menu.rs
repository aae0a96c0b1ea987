//! Menu parsing
//!
//! This module defines the numbered main menu and the parsing of the small
//! answers the controller asks for (menu option, list index, confirmation).

use std::fmt;

/// Main menu options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Connect to the server, pick a database and load its schema
    Connect,
    /// Ask a question, generate SQL and run it
    Ask,
    /// Exit the application
    Exit,
}

impl MenuChoice {
    /// All options, in menu order
    pub const ALL: [MenuChoice; 3] = [MenuChoice::Connect, MenuChoice::Ask, MenuChoice::Exit];

    /// Parse a menu answer; anything but a listed number is `None`
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Connect),
            "2" => Some(MenuChoice::Ask),
            "3" => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    /// Number the option is selected with
    pub fn key(self) -> u8 {
        match self {
            MenuChoice::Connect => 1,
            MenuChoice::Ask => 2,
            MenuChoice::Exit => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::Connect => "Connect to database",
            MenuChoice::Ask => "Ask a question and run the SQL",
            MenuChoice::Exit => "Exit",
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.key(), self.label())
    }
}

const RULE: &str = "========================================================";

/// Render the main menu
pub fn render_menu() -> String {
    let mut menu = format!("{}\n{:^56}\n{}\n", RULE, "MAIN MENU", RULE);
    for choice in MenuChoice::ALL {
        menu.push_str(&format!("{}\n", choice));
    }
    menu.push_str(RULE);
    menu
}

/// Parse a 1-based selection out of `len` entries into a 0-based index
pub fn parse_selection(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// `y` / `yes` in any case confirms; everything else declines
pub fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
