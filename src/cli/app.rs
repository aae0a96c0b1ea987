//! Interactive controller
//!
//! [`App`] runs the numbered main menu and sequences connection, schema
//! loading, SQL generation and execution. Progress follows [`SessionState`]:
//! questions are only accepted once a schema has been loaded.

use crate::cli::input::LineReader;
use crate::cli::menu::{self, MenuChoice};
use crate::cli::render;
use crate::database::executor::QueryOutcome;
use crate::database::guard::StatementKind;
use crate::database::session::DatabaseSession;
use crate::error::{Result, TextToSqlError};
use crate::llm::converter::TextToSqlConverter;
use std::fmt;
use tracing::{info, warn};

/// Where the session is in the connect, select, load sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    ServerConnected,
    DatabaseConnected { database: String },
    SchemaLoaded { database: String },
}

impl SessionState {
    pub fn is_schema_loaded(&self) -> bool {
        matches!(self, SessionState::SchemaLoaded { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unconnected => write!(f, "not connected"),
            SessionState::ServerConnected => write!(f, "connected to server"),
            SessionState::DatabaseConnected { database } => {
                write!(f, "connected to '{}', schema not loaded", database)
            }
            SessionState::SchemaLoaded { database } => {
                write!(f, "connected to '{}', schema loaded", database)
            }
        }
    }
}

/// Whether the menu loop keeps going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// How an "ask" action ended
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// No schema loaded yet
    NotReady,
    /// The question was empty
    EmptyQuestion,
    /// Input ended before a question was given
    Aborted,
    /// The provider returned an error
    GenerationFailed,
    /// A modifying statement was not confirmed
    Declined { sql: String },
    /// The statement was executed
    Ran { sql: String, outcome: QueryOutcome },
}

/// The menu-driven application
pub struct App<D: DatabaseSession> {
    db: D,
    converter: TextToSqlConverter,
    state: SessionState,
    allow_writes: bool,
}

impl<D: DatabaseSession> App<D> {
    pub fn new(db: D, converter: TextToSqlConverter, allow_writes: bool) -> Self {
        Self {
            db,
            converter,
            state: SessionState::Unconnected,
            allow_writes,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn converter(&self) -> &TextToSqlConverter {
        &self.converter
    }

    pub fn session(&self) -> &D {
        &self.db
    }

    /// Run the menu loop until "Exit" or end of input
    pub async fn run(&mut self, input: &mut dyn LineReader) -> Result<()> {
        loop {
            println!();
            println!("{}", menu::render_menu());

            let Some(line) = input.read_line("Choose an option: ")? else {
                println!("Exiting the program.");
                break;
            };

            if self.step(&line, input).await? == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Handle one menu answer
    pub async fn step(&mut self, line: &str, input: &mut dyn LineReader) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match MenuChoice::parse(line) {
            Some(MenuChoice::Connect) => self.connect(input).await?,
            Some(MenuChoice::Ask) => {
                self.ask(input).await?;
            }
            Some(MenuChoice::Exit) => {
                println!("Exiting the program.");
                return Ok(Flow::Exit);
            }
            None => println!("Invalid option. Try again."),
        }
        Ok(Flow::Continue)
    }

    /// Connect to the server, choose a database and load its schema
    ///
    /// Each stage that fails prints a diagnostic and stops the action; the
    /// state reflects the last stage that succeeded.
    pub async fn connect(&mut self, input: &mut dyn LineReader) -> Result<()> {
        println!("Connecting to the database server...");
        if let Err(e) = self.db.connect_server().await {
            warn!(error = %e, "server connection failed");
            println!("{}", e);
            println!("Check the credentials in the environment or config file.");
            return Ok(());
        }
        self.state = SessionState::ServerConnected;
        println!("Connected to the server.");

        let databases = match self.db.list_databases().await {
            Ok(databases) if databases.is_empty() => {
                println!("{}", TextToSqlError::NoDatabases);
                return Ok(());
            }
            Ok(databases) => databases,
            Err(e) => {
                println!("Could not list databases: {}", e);
                return Ok(());
            }
        };

        let Some(database) = self.choose_database(&databases, input)? else {
            println!("No database selected.");
            return Ok(());
        };

        if let Err(e) = self.db.connect_database(&database).await {
            println!("{}", e);
            return Ok(());
        }
        self.state = SessionState::DatabaseConnected {
            database: database.clone(),
        };
        println!("Connected to database '{}'.", database);

        let schema = match self.db.get_tables_and_columns().await {
            Ok(schema) => schema,
            Err(e) => {
                println!("Could not load the schema: {}", e);
                return Ok(());
            }
        };

        info!(
            database = %database,
            tables = schema.len(),
            columns = schema.column_count(),
            "schema loaded"
        );
        if schema.is_empty() {
            println!("Database '{}' has no tables.", database);
        }
        self.converter.set_schema(schema);
        println!("Schema:");
        print!("{}", self.converter.format_schema());
        self.state = SessionState::SchemaLoaded { database };
        println!("Database connected successfully.");
        Ok(())
    }

    /// Prompt until a valid database is chosen; `None` at end of input
    fn choose_database(
        &self,
        databases: &[String],
        input: &mut dyn LineReader,
    ) -> Result<Option<String>> {
        let default = self
            .db
            .default_database()
            .filter(|d| databases.iter().any(|name| name == d));

        print!("{}", render::render_database_list(databases, default));
        let prompt = match default {
            Some(d) => format!("Enter the number of the database to use [{}]: ", d),
            None => "Enter the number of the database to use: ".to_string(),
        };

        loop {
            let Some(line) = input.read_line(&prompt)? else {
                return Ok(None);
            };
            let line = line.trim();

            if line.is_empty() {
                if let Some(d) = default {
                    return Ok(Some(d.to_string()));
                }
            }
            match menu::parse_selection(line, databases.len()) {
                Some(index) => return Ok(Some(databases[index].clone())),
                None => println!(
                    "Invalid choice. Enter a number between 1 and {}.",
                    databases.len()
                ),
            }
        }
    }

    /// Ask a question, generate SQL for it and run the SQL
    pub async fn ask(&mut self, input: &mut dyn LineReader) -> Result<AskOutcome> {
        if !self.state.is_schema_loaded() {
            println!("Connect to a database first (option 1); no schema is loaded.");
            return Ok(AskOutcome::NotReady);
        }

        let Some(question) = input.read_line("Enter your question in natural language: ")? else {
            return Ok(AskOutcome::Aborted);
        };
        let question = question.trim();
        if question.is_empty() {
            println!("No question entered.");
            return Ok(AskOutcome::EmptyQuestion);
        }

        println!(
            "Generating SQL with {} ({})...",
            self.converter.provider().provider_name(),
            self.converter.provider().model()
        );
        let sql = match self.converter.generate_sql(question).await {
            Ok(sql) => sql,
            Err(e) => {
                println!("Could not generate SQL: {}", e);
                return Ok(AskOutcome::GenerationFailed);
            }
        };

        println!();
        println!("Generated SQL:");
        println!("{}", sql);

        if !self.allow_writes && !StatementKind::classify(&sql).is_read_only() {
            println!("This statement may modify the database.");
            let confirmed = input
                .read_line("Execute it anyway? [y/N]: ")?
                .map(|answer| menu::is_yes(&answer))
                .unwrap_or(false);
            if !confirmed {
                println!("Statement skipped.");
                return Ok(AskOutcome::Declined { sql });
            }
        }

        println!();
        println!("Executing...");
        let outcome = self.db.run_query(&sql).await;
        println!("{}", render::render_outcome(&outcome));
        Ok(AskOutcome::Ran { sql, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::SchemaIndex;
    use crate::llm::provider::{GenerationParams, LLMProvider, LLMResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory database session
    #[derive(Default)]
    struct FakeSession {
        refuse_server: bool,
        databases: Vec<String>,
        schema: SchemaIndex,
        default_database: Option<String>,
        selected: Option<String>,
        executed: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DatabaseSession for FakeSession {
        async fn connect_server(&mut self) -> Result<()> {
            if self.refuse_server {
                return Err(TextToSqlError::Config("access denied".to_string()));
            }
            self.selected = None;
            Ok(())
        }

        async fn list_databases(&self) -> Result<Vec<String>> {
            Ok(self.databases.clone())
        }

        async fn connect_database(&mut self, name: &str) -> Result<()> {
            self.selected = Some(name.to_string());
            Ok(())
        }

        async fn get_tables_and_columns(&self) -> Result<SchemaIndex> {
            Ok(self.schema.clone())
        }

        async fn run_query(&self, sql: &str) -> QueryOutcome {
            self.executed.lock().unwrap().push(sql.to_string());
            QueryOutcome::Rows {
                columns: vec!["COUNT(*)".to_string()],
                rows: vec![vec![Some("42".to_string())]],
            }
        }

        fn default_database(&self) -> Option<&str> {
            self.default_database.as_deref()
        }
    }

    /// Provider returning a fixed completion and counting calls
    struct CountingProvider {
        reply: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LLMProvider for CountingProvider {
        async fn generate(&self, _: &str, _: Option<&GenerationParams>) -> Result<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LLMResponse::new(self.reply.clone()))
        }

        fn provider_name(&self) -> &str {
            "Counting"
        }

        fn model(&self) -> &str {
            "counting-1"
        }

        fn has_api_key(&self) -> bool {
            true
        }
    }

    fn shop_session() -> FakeSession {
        FakeSession {
            databases: vec!["analytics".to_string(), "shop".to_string()],
            schema: SchemaIndex::from_tables([
                ("customers", vec!["id", "name"]),
                ("orders", vec!["id", "customer_id", "total"]),
            ]),
            ..Default::default()
        }
    }

    fn app(
        session: FakeSession,
        reply: &str,
        allow_writes: bool,
    ) -> (App<FakeSession>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            reply: reply.to_string(),
            calls: calls.clone(),
        };
        let converter = TextToSqlConverter::new(SchemaIndex::new(), Box::new(provider)).unwrap();
        (App::new(session, converter, allow_writes), calls)
    }

    fn script(lines: &[&str]) -> VecDeque<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_invalid_option_keeps_state() {
        let (mut app, calls) = app(shop_session(), "SELECT 1;", false);
        let mut input = script(&[]);

        let flow = app.step("9", &mut input).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(app.state(), &SessionState::Unconnected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exit_option() {
        let (mut app, _) = app(shop_session(), "", false);
        let mut input = script(&[]);
        assert_eq!(app.step("3", &mut input).await.unwrap(), Flow::Exit);
    }

    #[tokio::test]
    async fn test_ask_before_schema_makes_no_call() {
        let (mut app, calls) = app(shop_session(), "SELECT 1;", false);
        let mut input = script(&["How many orders?"]);

        let outcome = app.ask(&mut input).await.unwrap();
        assert_eq!(outcome, AskOutcome::NotReady);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(input.len(), 1);
    }

    #[tokio::test]
    async fn test_connect_loads_schema() {
        let (mut app, _) = app(shop_session(), "", false);
        let mut input = script(&["7", "two", "2"]);

        app.connect(&mut input).await.unwrap();
        assert_eq!(
            app.state(),
            &SessionState::SchemaLoaded {
                database: "shop".to_string()
            }
        );
        assert_eq!(app.session().selected.as_deref(), Some("shop"));
        assert!(app.converter().format_schema().contains("orders (id, customer_id, total)"));
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn test_connect_uses_default_database_on_empty_answer() {
        let mut session = shop_session();
        session.default_database = Some("analytics".to_string());
        let (mut app, _) = app(session, "", false);
        let mut input = script(&[""]);

        app.connect(&mut input).await.unwrap();
        assert_eq!(
            app.state(),
            &SessionState::SchemaLoaded {
                database: "analytics".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_server_failure_keeps_prior_state() {
        let mut session = shop_session();
        session.refuse_server = true;
        let (mut app, _) = app(session, "", false);
        let mut input = script(&[]);

        app.connect(&mut input).await.unwrap();
        assert_eq!(app.state(), &SessionState::Unconnected);
    }

    #[tokio::test]
    async fn test_no_databases_stops_at_server() {
        let mut session = shop_session();
        session.databases.clear();
        let (mut app, _) = app(session, "", false);
        let mut input = script(&[]);

        app.connect(&mut input).await.unwrap();
        assert_eq!(app.state(), &SessionState::ServerConnected);
    }

    #[tokio::test]
    async fn test_end_of_input_during_selection() {
        let (mut app, _) = app(shop_session(), "", false);
        let mut input = script(&["0"]);

        app.connect(&mut input).await.unwrap();
        assert_eq!(app.state(), &SessionState::ServerConnected);
    }

    #[tokio::test]
    async fn test_empty_question_makes_no_call() {
        let (mut app, calls) = app(shop_session(), "SELECT 1;", false);
        let mut input = script(&["2", "   "]);

        app.connect(&mut input).await.unwrap();
        let outcome = app.ask(&mut input).await.unwrap();
        assert_eq!(outcome, AskOutcome::EmptyQuestion);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_question_runs_generated_sql() {
        let session = shop_session();
        let executed = session.executed.clone();
        let (mut app, calls) = app(session, "SELECT COUNT(*) FROM orders;", false);
        let mut input = script(&["2", "How many orders exist?"]);

        app.connect(&mut input).await.unwrap();
        let outcome = app.ask(&mut input).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match outcome {
            AskOutcome::Ran { sql, outcome } => {
                assert_eq!(sql, "SELECT COUNT(*) FROM orders;");
                assert_eq!(outcome.row_count(), Some(1));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            executed.lock().unwrap().as_slice(),
            ["SELECT COUNT(*) FROM orders;"]
        );
    }

    #[tokio::test]
    async fn test_modifying_statement_needs_confirmation() {
        let session = shop_session();
        let executed = session.executed.clone();
        let (mut app, _) = app(session, "DELETE FROM orders;", false);
        let mut input = script(&["2", "Remove all orders", "n"]);

        app.connect(&mut input).await.unwrap();
        let outcome = app.ask(&mut input).await.unwrap();

        assert!(matches!(outcome, AskOutcome::Declined { .. }));
        assert!(executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_modifying_statement_confirmed() {
        let session = shop_session();
        let executed = session.executed.clone();
        let (mut app, _) = app(session, "DELETE FROM orders;", false);
        let mut input = script(&["2", "Remove all orders", "yes"]);

        app.connect(&mut input).await.unwrap();
        let outcome = app.ask(&mut input).await.unwrap();

        assert!(matches!(outcome, AskOutcome::Ran { .. }));
        assert_eq!(executed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_allow_writes_skips_confirmation() {
        let (mut app, _) = app(shop_session(), "UPDATE orders SET total = 0;", true);
        let mut input = script(&["2", "Zero every total"]);

        app.connect(&mut input).await.unwrap();
        let outcome = app.ask(&mut input).await.unwrap();
        assert!(matches!(outcome, AskOutcome::Ran { .. }));
    }

    #[tokio::test]
    async fn test_run_until_end_of_input() {
        let (mut app, calls) = app(shop_session(), "SELECT COUNT(*) FROM orders;", false);
        let mut input = script(&["x", "1", "2", "2", "How many orders?"]);

        app.run(&mut input).await.unwrap();
        assert!(app.state().is_schema_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_display() {
        let state = SessionState::SchemaLoaded {
            database: "shop".to_string(),
        };
        assert_eq!(state.to_string(), "connected to 'shop', schema loaded");
    }
}
