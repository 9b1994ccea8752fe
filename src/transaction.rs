use std::collections::VecDeque;
use std::fmt;

use tracing::warn;

use crate::index::KeySet;
use crate::row::Row;

/// The kind of mutation a log entry can reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("INSERT"),
            Self::Update => f.write_str("UPDATE"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

/// What is needed to reverse one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A row was inserted; reversing deletes it again.
    Insert { primary_key: String },
    /// `column` was set to `value` in every row of `previous`; reversing puts
    /// back the old cell of that column only.
    Update {
        column: String,
        value: String,
        previous: Vec<Row>,
    },
    /// Rows were removed; reversing inserts the snapshots again.
    Delete { previous: Vec<Row> },
}

/// One committed mutation of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub table: String,
    pub change: Change,
}

impl LogEntry {
    pub fn insert(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            change: Change::Insert {
                primary_key: primary_key.into(),
            },
        }
    }

    pub fn update(
        table: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
        previous: Vec<Row>,
    ) -> Self {
        Self {
            table: table.into(),
            change: Change::Update {
                column: column.into(),
                value: value.into(),
                previous,
            },
        }
    }

    pub fn delete(table: impl Into<String>, previous: Vec<Row>) -> Self {
        Self {
            table: table.into(),
            change: Change::Delete { previous },
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self.change {
            Change::Insert { .. } => OperationKind::Insert,
            Change::Update { .. } => OperationKind::Update,
            Change::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Primary keys the mutation touched, as they were before it.
    pub fn primary_keys(&self) -> KeySet {
        match &self.change {
            Change::Insert { primary_key } => KeySet::from([primary_key.clone()]),
            Change::Update { previous, .. } | Change::Delete { previous } => previous
                .iter()
                .map(|row| row.primary_key().to_string())
                .collect(),
        }
    }

    /// Number of rows the mutation touched.
    pub fn rows_affected(&self) -> usize {
        match &self.change {
            Change::Insert { .. } => 1,
            Change::Update { previous, .. } | Change::Delete { previous } => previous.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    Empty,
    NonEmpty,
}

/// Bounded stack of reversible mutations, newest last.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl TransactionLog {
    /// A log keeping at most `capacity` entries; `0` keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest one when the log is full.
    pub fn record(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity
            && let Some(evicted) = self.entries.pop_front()
        {
            warn!(
                table = %evicted.table,
                kind = %evicted.kind(),
                "undo log full, oldest entry dropped"
            );
        }
        self.entries.push_back(entry);
    }

    /// Removes and returns the newest entry.
    pub fn pop(&mut self) -> Option<LogEntry> {
        self.entries.pop_back()
    }

    /// Puts an entry back on top after a failed undo.
    pub(crate) fn push_back(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
    }

    /// The newest entry, if any.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Drops every entry that refers to `table`.
    pub fn forget_table(&mut self, table: &str) {
        self.entries.retain(|entry| entry.table != table);
    }

    pub fn state(&self) -> LogState {
        if self.entries.is_empty() {
            LogState::Empty
        } else {
            LogState::NonEmpty
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
