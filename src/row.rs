use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

use allocative::Allocative;

use crate::table::Schema;

/// One table row: the cells of every column, in schema order.
///
/// Rows handed out by a table are copies, so callers can keep them around
/// without affecting the stored data.
#[derive(Debug, Clone, PartialEq, Eq, Allocative)]
pub struct Row {
    #[allocative(skip)]
    schema: Arc<Schema>,
    values: Vec<String>,
}

impl Row {
    pub(crate) fn new(schema: Arc<Schema>, values: Vec<String>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    /// The primary key, i.e. the cell of the first column.
    pub fn primary_key(&self) -> &str {
        &self.values[0]
    }

    /// The cell of `column`, or `None` if the column is not in the schema.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .position(column)
            .map(|idx| self.values[idx].as_str())
    }

    /// The cells in column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    /// `(column, cell)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub(crate) fn set(&mut self, idx: usize, value: String) -> String {
        std::mem::replace(&mut self.values[idx], value)
    }
}

/// Rows of a table keyed by primary key.
///
/// The store only owns rows; keeping the column indexes in step with it is
/// the job of [crate::Table].
#[derive(Debug, Clone, Default, Allocative)]
pub struct RowStore {
    rows: BTreeMap<String, Row>,
}

impl RowStore {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, primary_key: &str) -> bool {
        self.rows.contains_key(primary_key)
    }

    pub fn get(&self, primary_key: &str) -> Option<&Row> {
        self.rows.get(primary_key)
    }

    pub(crate) fn get_mut(&mut self, primary_key: &str) -> Option<&mut Row> {
        self.rows.get_mut(primary_key)
    }

    /// Stores `row` under its primary key. Returns the row previously stored
    /// under that key, if any.
    pub(crate) fn insert(&mut self, row: Row) -> Option<Row> {
        self.rows.insert(row.primary_key().to_string(), row)
    }

    pub(crate) fn remove(&mut self, primary_key: &str) -> Option<Row> {
        self.rows.remove(primary_key)
    }

    /// Rows in primary key order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Row> {
        self.rows.values()
    }

    /// Primary keys in order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Row> {
        self.rows.keys()
    }
}
