use allocative::Allocative;

use crate::config::IndexBackend;
use crate::index::{ColumnIndex, OrderedIndex};

/// Represents a column within a table: its name and the index over its cells.
#[derive(Debug, Clone, Allocative)]
pub struct Column {
    /// The name of the column.
    pub name: String,
    index: ColumnIndex,
}

impl Column {
    /// Creates a column with an empty index of the given backend.
    pub fn new(name: String, backend: IndexBackend) -> Self {
        Self {
            name,
            index: ColumnIndex::new(backend),
        }
    }

    /// Read-only access to the column index.
    pub fn index(&self) -> &ColumnIndex {
        &self.index
    }

    /// Records that the row `primary_key` holds `value` in this column.
    pub(crate) fn add(&mut self, value: &str, primary_key: &str) {
        self.index.insert(value, primary_key);
    }

    /// Forgets that the row `primary_key` holds `value` in this column.
    pub(crate) fn remove(&mut self, value: &str, primary_key: &str) {
        self.index.remove(value, primary_key);
    }

    /// Moves `primary_key` from the `old` bucket to the `new` one.
    pub(crate) fn replace(&mut self, old: &str, new: &str, primary_key: &str) {
        self.index.remove(old, primary_key);
        self.index.insert(new, primary_key);
    }
}
