use thiserror::Error;

/// Errors returned by every fallible operation of the engine.
///
/// A call that returns an error leaves the database exactly as it was before
/// the call: row stores, column indexes and the transaction log are untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A table with this name already exists.
    #[error("table {0:?} already exists")]
    DuplicateTable(String),

    /// No table with this name exists.
    #[error("no such table: {0:?}")]
    TableNotFound(String),

    /// The same column name appears twice in a table definition.
    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),

    /// A table definition without any column.
    #[error("a table needs at least one column")]
    EmptyColumnList,

    /// The number of values does not match the number of columns.
    #[error("expected {expected} values, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// A row with this primary key is already stored.
    #[error("duplicate primary key {0:?}")]
    DuplicatePrimaryKey(String),

    /// The column is not part of the table schema.
    #[error("column not found: {0:?}")]
    ColumnNotFound(String),

    /// No row is stored under this primary key.
    #[error("row not found: {0:?}")]
    RowNotFound(String),

    /// The comparison operator is not one of `=`, `!=`, `<`, `<=`, `>`, `>=`.
    #[error("unsupported operator {0:?}")]
    UnsupportedOperator(String),

    /// The combinator is neither `AND` nor `OR`.
    #[error("unsupported combinator {0:?}")]
    UnsupportedCombinator(String),

    /// A predicate chain needs exactly one combinator between two predicates.
    #[error("{predicates} predicates need {expected} combinators, found {combinators}", expected = .predicates.saturating_sub(1))]
    CombinatorMismatch {
        predicates: usize,
        combinators: usize,
    },

    /// `undo` was called with an empty transaction log.
    #[error("nothing to undo")]
    NothingToUndo,

    /// `EXECUTE n` named a position the command history does not hold.
    #[error("no history entry {0}")]
    HistoryEntryNotFound(usize),

    /// A command string could not be tokenized or parsed.
    #[error("syntax error: {0}")]
    Syntax(String),
}

pub type Result<T> = std::result::Result<T, Error>;
