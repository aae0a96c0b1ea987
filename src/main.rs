// text-to-sql: ask a MySQL database questions in plain language
//
// This is the main entry point for the text-to-sql application.

use anyhow::{Context, Result};
use text_to_sql::cli::{App, EditorReader};
use text_to_sql::config::{self, AppConfig};
use text_to_sql::database::{DatabaseManager, SchemaIndex};
use text_to_sql::llm::TextToSqlConverter;
use text_to_sql::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // .env first, so RUST_LOG from the file reaches the log filter
    config::load_env_file();
    logging::init_logging()?;

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("text-to-sql v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "Database server: {} (user: {}, password {})",
        config.database.server_address(),
        config.database.username,
        if config.database.password.is_empty() { "not set" } else { "set" }
    );
    println!("Model: {}", config.llm.model);
    if config.allow_writes {
        println!("Modifying statements run without confirmation.");
    }

    let converter = TextToSqlConverter::from_config(SchemaIndex::new(), &config.llm)
        .context("Failed to initialize the Gemini client")?;
    let db = DatabaseManager::new(&config.database);
    let mut app = App::new(db, converter, config.allow_writes);

    let mut reader = EditorReader::new()?;
    info!("starting menu loop");
    let result = app.run(&mut reader).await;
    reader.save_history();
    result?;

    Ok(())
}
