//! Output rendering
//!
//! Result sets are drawn with `comfy-table`; everything else is plain text.

use crate::database::executor::QueryOutcome;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

const NULL: &str = "NULL";

/// Render the outcome of a statement for the terminal
pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Rows { columns, rows } => {
            if columns.is_empty() {
                return "The query returned no columns.".to_string();
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(columns.iter().map(String::as_str));

            for row in rows {
                table.add_row(row.iter().map(|cell| cell.as_deref().unwrap_or(NULL)));
            }

            let noun = if rows.len() == 1 { "row" } else { "rows" };
            format!("{}\n{} {} returned", table, rows.len(), noun)
        }
        QueryOutcome::Executed { rows_affected } => {
            format!("Query executed successfully ({} rows affected)", rows_affected)
        }
        QueryOutcome::Failed(message) => format!("Error executing the query: {}", message),
    }
}

/// Numbered list of databases; `default` is marked when present
pub fn render_database_list(databases: &[String], default: Option<&str>) -> String {
    let mut out = String::from("Available databases:\n");
    for (i, name) in databases.iter().enumerate() {
        if Some(name.as_str()) == default {
            out.push_str(&format!("  {}. {} (default)\n", i + 1, name));
        } else {
            out.push_str(&format!("  {}. {}\n", i + 1, name));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rows_with_null() {
        let outcome = QueryOutcome::Rows {
            columns: vec!["id".to_string(), "email".to_string()],
            rows: vec![
                vec![Some("1".to_string()), Some("a@example.com".to_string())],
                vec![Some("2".to_string()), None],
            ],
        };

        let out = render_outcome(&outcome);
        assert!(out.contains("id"));
        assert!(out.contains("email"));
        assert!(out.contains("a@example.com"));
        assert!(out.contains("NULL"));
        assert!(out.ends_with("2 rows returned"));
    }

    #[test]
    fn test_render_empty_result_set() {
        let outcome = QueryOutcome::Rows {
            columns: vec!["COUNT(*)".to_string()],
            rows: vec![vec![Some("0".to_string())]],
        };
        assert!(render_outcome(&outcome).ends_with("1 row returned"));

        let outcome = QueryOutcome::Rows {
            columns: vec!["id".to_string()],
            rows: vec![],
        };
        assert!(render_outcome(&outcome).ends_with("0 rows returned"));
    }

    #[test]
    fn test_render_executed_and_failed() {
        let out = render_outcome(&QueryOutcome::Executed { rows_affected: 3 });
        assert_eq!(out, "Query executed successfully (3 rows affected)");

        let out = render_outcome(&QueryOutcome::Failed("Table 'shop.nope' doesn't exist".into()));
        assert!(out.starts_with("Error executing the query: "));
        assert!(out.contains("doesn't exist"));
    }

    #[test]
    fn test_render_database_list() {
        let dbs = vec!["analytics".to_string(), "shop".to_string()];
        let out = render_database_list(&dbs, Some("shop"));
        assert!(out.contains("  1. analytics\n"));
        assert!(out.contains("  2. shop (default)\n"));
    }
}
