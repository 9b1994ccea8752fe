use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::ast::{Statement, WhereClause};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::history::QueryHistory;
use crate::parser::Parser;
use crate::row::Row;
use crate::table::{Schema, Table};
use crate::tokenizer::Tokenizer;
use crate::transaction::{Change, LogEntry, OperationKind, TransactionLog};

/// The main entry point of the engine.
/// It owns the tables and the transaction log used by [Database::undo].
///
/// Tables are only handed out as shared references so that every mutation
/// passes through the database and gets logged.
pub struct Database {
    /// A map of table names to their respective [Table] structures.
    tables: HashMap<String, Table>,
    log: TransactionLog,
    history: QueryHistory,
    config: EngineConfig,
}

/// Represents the result of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names of the table, in table order.
    pub columns: Vec<String>,
    /// Matching rows in primary key order.
    pub rows: Vec<Row>,
}

/// Header line then one line per row, cells separated by tabs.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}", row.values().join("\t"))?;
        }
        Ok(())
    }
}

/// Describes the mutation reverted by [Database::undo].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOutcome {
    pub kind: OperationKind,
    pub table: String,
    pub rows_affected: usize,
}

/// What a statement run through [Database::execute] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    TableCreated(String),
    TableDropped(String),
    RowInserted(String),
    Rows(QueryResult),
    Updated { table: String, rows: usize },
    Deleted { table: String, rows: usize },
    Undone(UndoOutcome),
    /// Remembered commands, oldest first.
    History(Vec<String>),
    HistoryCleared,
}

impl fmt::Display for ExecOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableCreated(table) => write!(f, "Table {table} created"),
            Self::TableDropped(table) => write!(f, "Table {table} dropped"),
            Self::RowInserted(table) => write!(f, "Row inserted into {table}"),
            Self::Rows(result) => write!(f, "{result}"),
            Self::Updated { table, rows } => {
                write!(f, "Table {table} updated. {rows} rows affected.")
            }
            Self::Deleted { table, rows } => {
                write!(f, "Rows deleted from {table}. {rows} rows affected.")
            }
            Self::Undone(outcome) => write!(
                f,
                "Undid {} on {}. {} rows affected.",
                outcome.kind, outcome.table, outcome.rows_affected
            ),
            Self::History(commands) => {
                for (idx, command) in commands.iter().enumerate() {
                    writeln!(f, "{}: {command}", idx + 1)?;
                }
                Ok(())
            }
            Self::HistoryCleared => write!(f, "Query history cleared."),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Creates a new, empty database with the default [EngineConfig].
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            tables: HashMap::default(),
            log: TransactionLog::new(config.undo_depth),
            history: QueryHistory::new(config.history_depth),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a new table. The first column is the primary key.
    ///
    /// # Errors
    /// - [Error::DuplicateTable] if a table with the same name exists.
    /// - [Error::EmptyColumnList] if `columns` is empty.
    /// - [Error::DuplicateColumn] if a column name repeats.
    ///
    /// # Example
    /// ```
    /// use rowdb::Database;
    /// let mut db = Database::new();
    /// db.create_table("student", ["id", "name", "gpa"]).unwrap();
    /// assert_eq!(db.table("student").unwrap().primary_key_column(), "id");
    /// assert!(db.create_table("student", ["id"]).is_err());
    /// ```
    pub fn create_table<I, S>(&mut self, name: impl Into<String>, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(Error::DuplicateTable(name));
        }
        let schema = Schema::new(columns.into_iter().map(Into::into).collect())?;

        debug!(table = %name, columns = ?schema.columns(), backend = ?self.config.index_backend, "created table");
        let table = Table::new(name.clone(), schema, self.config.index_backend);
        self.tables.insert(name, table);
        Ok(())
    }

    /// Removes a table and every undo entry that refers to it.
    ///
    /// # Errors
    /// Returns [Error::TableNotFound] if the table does not exist.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        match self.tables.remove(name) {
            Some(_) => {
                self.log.forget_table(name);
                debug!(table = name, "dropped table");
                Ok(())
            }
            None => Err(Error::TableNotFound(name.to_string())),
        }
    }

    /// Retrieves a table by name.
    ///
    /// # Errors
    /// Returns [Error::TableNotFound] if the table does not exist.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Returns a list of all table names currently stored in the database.
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Inserts a row; `values[0]` is its primary key.
    ///
    /// # Errors
    /// [Error::TableNotFound], [Error::ArityMismatch] or
    /// [Error::DuplicatePrimaryKey]; nothing is inserted or logged then.
    pub fn insert_row<I, S>(&mut self, table: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        let primary_key = self.table_mut(table)?.insert_row(values)?;
        self.log.record(LogEntry::insert(table, primary_key));
        Ok(())
    }

    /// Returns the rows of `table` matching `filter`; an empty filter selects
    /// every row.
    ///
    /// # Example
    /// ```
    /// use rowdb::{Database, Operator, Predicate, WhereClause};
    ///
    /// let mut db = Database::new();
    /// db.create_table("student", ["id", "gpa", "age"]).unwrap();
    /// db.insert_row("student", ["1", "3.5", "20"]).unwrap();
    /// db.insert_row("student", ["2", "3.9", "19"]).unwrap();
    /// db.insert_row("student", ["3", "3.2", "21"]).unwrap();
    ///
    /// let filter = WhereClause::new(Predicate::new("gpa", Operator::Gt, "3.0"))
    ///     .and(Predicate::new("age", Operator::Lt, "20"))
    ///     .or(Predicate::new("gpa", Operator::Eq, "3.2"));
    /// let result = db.select_rows("student", &filter).unwrap();
    ///
    /// assert_eq!(result.columns, vec!["id", "gpa", "age"]);
    /// let ids: Vec<&str> = result.rows.iter().map(|row| row.primary_key()).collect();
    /// assert_eq!(ids, vec!["2", "3"]);
    /// ```
    ///
    /// # Errors
    /// [Error::TableNotFound] or [Error::ColumnNotFound].
    pub fn select_rows(&self, table: &str, filter: &WhereClause) -> Result<QueryResult> {
        let table = self.table(table)?;
        Ok(QueryResult {
            columns: table.columns().to_vec(),
            rows: table.select_rows(filter)?,
        })
    }

    /// Sets `column` to `value` in every row of `table` matching `filter`.
    /// Returns the number of updated rows.
    ///
    /// # Errors
    /// [Error::TableNotFound], [Error::ColumnNotFound] for the target or a
    /// predicate column, or [Error::DuplicatePrimaryKey] when a primary key
    /// update would collide.
    pub fn update_rows(&mut self, table: &str, filter: &WhereClause, column: &str, value: &str) -> Result<usize> {
        let target = self.table_mut(table)?;
        // an unknown target column is reported before the filter is evaluated
        target.index(column)?;
        let keys = target.matching_keys(filter)?;
        let previous = target.update_rows(&keys, column, value)?;

        let affected = previous.len();
        self.log
            .record(LogEntry::update(table, column, value, previous));
        Ok(affected)
    }

    /// Deletes every row of `table` matching `filter`. Returns the number of
    /// deleted rows.
    ///
    /// # Errors
    /// [Error::TableNotFound] or [Error::ColumnNotFound].
    pub fn delete_rows(&mut self, table: &str, filter: &WhereClause) -> Result<usize> {
        let target = self.table_mut(table)?;
        let keys = target.matching_keys(filter)?;
        let removed = target.delete_rows(&keys)?;

        let affected = removed.len();
        self.log.record(LogEntry::delete(table, removed));
        Ok(affected)
    }

    /// Reverts the most recent logged mutation. Each call goes one step
    /// further back in history.
    ///
    /// # Errors
    /// Returns [Error::NothingToUndo] when the log is empty. If the reversal
    /// itself fails, the entry stays in the log and the tables are unchanged.
    pub fn undo(&mut self) -> Result<UndoOutcome> {
        let entry = self.log.pop().ok_or(Error::NothingToUndo)?;

        match self.revert(&entry) {
            Ok(()) => {
                let outcome = UndoOutcome {
                    kind: entry.kind(),
                    rows_affected: entry.rows_affected(),
                    table: entry.table,
                };
                debug!(table = %outcome.table, kind = %outcome.kind, rows = outcome.rows_affected, "undone");
                Ok(outcome)
            }
            Err(err) => {
                self.log.push_back(entry);
                Err(err)
            }
        }
    }

    fn revert(&mut self, entry: &LogEntry) -> Result<()> {
        let table = self.table_mut(&entry.table)?;
        match &entry.change {
            Change::Insert { primary_key } => {
                table.delete_rows(&entry.primary_keys())?;
                debug!(table = %entry.table, %primary_key, "reverting insert");
            }
            Change::Update {
                column,
                value,
                previous,
            } => table.revert_update(column, value, previous)?,
            Change::Delete { previous } => table.restore_rows(previous)?,
        }
        Ok(())
    }

    /// Number of mutations that can currently be undone.
    pub fn undo_depth(&self) -> usize {
        self.log.len()
    }

    /// Commands run through [Database::execute], oldest first.
    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    /// Parses and runs one command. Mutations go through the same methods as
    /// the typed API and are logged the same way.
    ///
    /// Every command that parses is remembered in the history before it runs,
    /// even if it then fails. `HISTORY`, `EXECUTE n` and `CLEAR HISTORY` are
    /// not remembered; the command replayed by `EXECUTE n` is, again.
    ///
    /// # Errors
    /// [Error::Syntax] if the command does not parse,
    /// [Error::HistoryEntryNotFound] if `EXECUTE n` names no remembered
    /// command, otherwise whatever the underlying operation returns.
    ///
    /// # Example
    /// ```
    /// use rowdb::{Database, ExecOutcome};
    /// let mut db = Database::new();
    /// db.execute("CREATE TABLE users (id, name)").unwrap();
    /// db.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
    /// let outcome = db.execute("DELETE FROM users WHERE id > 12").unwrap();
    /// assert_eq!(outcome.to_string(), "Rows deleted from users. 0 rows affected.");
    ///
    /// let result = db.query("SELECT * FROM users").unwrap();
    /// assert_eq!(result.rows[0].get("name"), Some("'Alice'"));
    /// ```
    pub fn execute(&mut self, sql: &str) -> Result<ExecOutcome> {
        let tokens = Tokenizer::new(sql).tokenize()?;
        let statement = Parser::new(tokens).parse()?;
        if !statement.is_history_command() {
            self.history.record(sql.trim());
        }

        let outcome = match statement {
            Statement::CreateTable(create) => {
                self.create_table(create.name.as_str(), create.columns)?;
                ExecOutcome::TableCreated(create.name)
            }
            Statement::DropTable(drop) => {
                self.drop_table(&drop.name)?;
                ExecOutcome::TableDropped(drop.name)
            }
            Statement::InsertInto(insert) => {
                self.insert_row(&insert.table, insert.values)?;
                ExecOutcome::RowInserted(insert.table)
            }
            Statement::Select(select) => ExecOutcome::Rows(self.select_rows(&select.table, &select.filter)?),
            Statement::Update(update) => {
                let rows = self.update_rows(&update.table, &update.filter, &update.column, &update.value)?;
                ExecOutcome::Updated {
                    table: update.table,
                    rows,
                }
            }
            Statement::Delete(delete) => {
                let rows = self.delete_rows(&delete.table, &delete.filter)?;
                ExecOutcome::Deleted {
                    table: delete.table,
                    rows,
                }
            }
            Statement::Undo => ExecOutcome::Undone(self.undo()?),
            Statement::History => ExecOutcome::History(self.history.iter().map(str::to_string).collect()),
            Statement::Execute(position) => {
                let command = self
                    .history
                    .get(position)
                    .ok_or(Error::HistoryEntryNotFound(position))?
                    .to_string();
                debug!(position, %command, "replaying command from history");
                return self.execute(&command);
            }
            Statement::ClearHistory => {
                self.history.clear();
                ExecOutcome::HistoryCleared
            }
        };
        Ok(outcome)
    }

    /// Runs a `SELECT` without needing mutable access.
    ///
    /// # Errors
    /// [Error::Syntax] if the command is not a `SELECT`.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let tokens = Tokenizer::new(sql).tokenize()?;
        let Statement::Select(select) = Parser::new(tokens).parse()? else {
            return Err(Error::Syntax(format!("{sql:?} is not a SELECT statement")));
        };
        self.select_rows(&select.table, &select.filter)
    }
}
