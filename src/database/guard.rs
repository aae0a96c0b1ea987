//! Statement guard
//!
//! Generated SQL is untrusted: it comes straight from a remote model. This
//! module classifies a SQL string as read-only or modifying so the caller
//! can require confirmation before anything that may change data runs.
//!
//! The classifier is a keyword scanner, not a parser. It skips quoted
//! strings, quoted identifiers and comments, splits on `;`, and errs on the
//! side of [`StatementKind::Modifying`]. Comment rules follow MySQL: the
//! body of `/*! ... */` is executed and therefore scanned, and `--` only
//! starts a comment when followed by whitespace or the end of input.

/// Statements that only read, as long as no write keyword follows
const READ_LEADERS: [&str; 2] = ["SELECT", "WITH"];

/// Statements that never change data
const INSPECT_LEADERS: [&str; 4] = ["SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Keywords that turn a SELECT/WITH into something that writes or locks
const WRITE_KEYWORDS: [&str; 13] = [
    "INSERT", "UPDATE", "DELETE", "REPLACE", "INTO", "DROP", "ALTER", "CREATE", "TRUNCATE",
    "OUTFILE", "DUMPFILE", "LOCK", "GRANT",
];

/// Effect class of a SQL string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Only reads data
    ReadOnly,
    /// May modify data or schema, or could not be proven read-only
    Modifying,
}

impl StatementKind {
    /// Classify a SQL string
    pub fn classify(sql: &str) -> Self {
        let statements = keywords_by_statement(sql);

        let words = match statements.as_slice() {
            [] if is_blank(sql) => return StatementKind::ReadOnly,
            // Text with no visible words cannot be shown to be harmless
            [] => return StatementKind::Modifying,
            [single] => single,
            _ => return StatementKind::Modifying,
        };

        let leader = words[0].as_str();
        if INSPECT_LEADERS.contains(&leader) {
            return StatementKind::ReadOnly;
        }

        if READ_LEADERS.contains(&leader)
            && !words.iter().any(|w| WRITE_KEYWORDS.contains(&w.as_str()))
        {
            return StatementKind::ReadOnly;
        }

        StatementKind::Modifying
    }

    pub fn is_read_only(self) -> bool {
        self == StatementKind::ReadOnly
    }
}

/// Split SQL into statements, each reduced to its uppercase bare words
///
/// Statements without any word (e.g. a trailing `;`) are dropped.
fn keywords_by_statement(sql: &str) -> Vec<Vec<String>> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '\'' | '"' | '`' => {
                i = skip_quoted(&chars, i);
            }
            '-' if next == Some('-') && starts_dash_comment(chars.get(i + 2).copied()) => {
                i = skip_line(&chars, i);
            }
            '#' => {
                i = skip_line(&chars, i);
            }
            '/' if next == Some('*') && chars.get(i + 2) == Some(&'!') => {
                // Executable comment: drop the marker and optional version
                i += 3;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                i = skip_block_comment(&chars, i);
            }
            ';' => {
                if !current.is_empty() {
                    statements.push(std::mem::take(&mut current));
                }
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                current.push(word.to_uppercase());
            }
            _ => {
                i += 1;
            }
        }
    }

    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// Only whitespace and statement separators
fn is_blank(sql: &str) -> bool {
    sql.chars().all(|c| c.is_whitespace() || c == ';')
}

/// `--` opens a comment only before whitespace, a control character or the end
fn starts_dash_comment(after: Option<char>) -> bool {
    match after {
        None => true,
        Some(c) => c.is_whitespace() || c.is_control(),
    }
}

/// Return the index just past the closing quote that matches `chars[start]`
fn skip_quoted(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\\' && quote != '`' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn skip_line(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| c == '\n')
        .map(|offset| start + offset + 1)
        .unwrap_or(chars.len())
}

fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}
