use std::collections::HashSet;
use std::ops::Bound;
use std::sync::Arc;

use allocative::Allocative;
use tracing::{debug, warn};

use crate::ast::WhereClause;
use crate::column::Column;
use crate::config::IndexBackend;
use crate::error::{Error, Result};
use crate::evaluator::PredicateEvaluator;
use crate::index::{ColumnIndex, KeySet, OrderedIndex};
use crate::row::{Row, RowStore};

/// Ordered column names of a table. The first column is the primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// # Errors
    /// Returns [Error::EmptyColumnList] for an empty list and
    /// [Error::DuplicateColumn] if a name appears twice.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::EmptyColumnList);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(Error::DuplicateColumn(dup.clone()));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `name` in the column list.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }

    /// Name of the primary key column.
    pub fn primary_key(&self) -> &str {
        &self.columns[0]
    }
}

/// Rows keyed by primary key plus one ordered index per column.
///
/// Every stored row appears in each column index exactly once, under its
/// current cell for that column, and every key found in an index belongs to a
/// stored row. All mutations go through this type and validate their inputs
/// before touching anything, so a failed call leaves the table unchanged.
#[derive(Debug, Clone, Allocative)]
pub struct Table {
    name: String,
    #[allocative(skip)]
    schema: Arc<Schema>,
    rows: RowStore,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: String, schema: Schema, backend: IndexBackend) -> Self {
        let columns = schema
            .columns()
            .iter()
            .map(|col| Column::new(col.clone(), backend))
            .collect();
        Self {
            name,
            schema: Arc::new(schema),
            rows: RowStore::default(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn primary_key_column(&self) -> &str {
        self.schema.primary_key()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks a row up by primary key.
    pub fn get_row(&self, primary_key: &str) -> Option<&Row> {
        self.rows.get(primary_key)
    }

    /// All rows in primary key order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// The index of `column`.
    ///
    /// # Errors
    /// Returns [Error::ColumnNotFound] if the column is not in the schema.
    pub fn index(&self, column: &str) -> Result<&ColumnIndex> {
        let idx = self.column_position(column)?;
        Ok(self.columns[idx].index())
    }

    /// Heap bytes held by the rows and column indexes.
    pub fn allocated_bytes(&self) -> usize {
        allocative::size_of_unique_allocated_data(self)
    }

    fn column_position(&self, column: &str) -> Result<usize> {
        self.schema
            .position(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    fn check_rows_exist<'k>(&self, primary_keys: impl IntoIterator<Item = &'k String>) -> Result<()> {
        match primary_keys.into_iter().find(|key| !self.rows.contains(key)) {
            Some(missing) => Err(Error::RowNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    fn index_row(&mut self, row: &Row) {
        for (column, value) in self.columns.iter_mut().zip(row.values()) {
            column.add(value, row.primary_key());
        }
    }

    fn unindex_row(&mut self, row: &Row) {
        for (column, value) in self.columns.iter_mut().zip(row.values()) {
            column.remove(value, row.primary_key());
        }
    }

    /// Inserts a row. `values[0]` is its primary key.
    ///
    /// Returns the primary key of the new row.
    ///
    /// # Errors
    /// - [Error::ArityMismatch] if there is not exactly one value per column.
    /// - [Error::DuplicatePrimaryKey] if a row with the same key exists.
    pub fn insert_row(&mut self, values: Vec<String>) -> Result<String> {
        if values.len() != self.schema.len() {
            return Err(Error::ArityMismatch {
                expected: self.schema.len(),
                found: values.len(),
            });
        }
        if self.rows.contains(&values[0]) {
            return Err(Error::DuplicatePrimaryKey(values[0].clone()));
        }

        let row = Row::new(Arc::clone(&self.schema), values);
        let primary_key = row.primary_key().to_string();
        self.index_row(&row);
        self.rows.insert(row);

        debug!(table = %self.name, %primary_key, "inserted row");
        Ok(primary_key)
    }

    /// Sets `column` to `new_value` in every row of `primary_keys`.
    ///
    /// Returns a copy of every affected row as it was before the update, in
    /// primary key order.
    ///
    /// Updating the primary key column moves the row to the new key; this is
    /// only possible for a single row whose new key is free.
    ///
    /// # Errors
    /// - [Error::ColumnNotFound] if `column` is not in the schema.
    /// - [Error::RowNotFound] if one of the keys is not stored.
    /// - [Error::DuplicatePrimaryKey] if a primary key update would collide.
    pub fn update_rows(&mut self, primary_keys: &KeySet, column: &str, new_value: &str) -> Result<Vec<Row>> {
        let idx = self.column_position(column)?;
        self.check_rows_exist(primary_keys)?;

        if idx == 0 {
            return self.update_primary_key(primary_keys, new_value);
        }

        let mut previous = Vec::with_capacity(primary_keys.len());
        for key in primary_keys {
            let Some(row) = self.rows.get_mut(key) else {
                continue;
            };
            previous.push(row.clone());
            let old = row.set(idx, new_value.to_string());
            self.columns[idx].replace(&old, new_value, key);
        }

        debug!(table = %self.name, column, rows = previous.len(), "updated rows");
        Ok(previous)
    }

    fn update_primary_key(&mut self, primary_keys: &KeySet, new_key: &str) -> Result<Vec<Row>> {
        let Some(old_key) = primary_keys.first() else {
            return Ok(Vec::new());
        };
        if primary_keys.len() > 1 || (old_key != new_key && self.rows.contains(new_key)) {
            return Err(Error::DuplicatePrimaryKey(new_key.to_string()));
        }
        let Some(mut row) = self.rows.remove(old_key) else {
            return Err(Error::RowNotFound(old_key.clone()));
        };

        let previous = row.clone();
        self.unindex_row(&row);
        row.set(0, new_key.to_string());
        self.index_row(&row);
        self.rows.insert(row);

        debug!(table = %self.name, %old_key, %new_key, "moved row to new primary key");
        Ok(vec![previous])
    }

    /// Removes every row of `primary_keys` and its index entries.
    ///
    /// Returns the removed rows in primary key order.
    ///
    /// # Errors
    /// Returns [Error::RowNotFound] if one of the keys is not stored; nothing is
    /// removed in that case.
    pub fn delete_rows(&mut self, primary_keys: &KeySet) -> Result<Vec<Row>> {
        self.check_rows_exist(primary_keys)?;

        let mut removed = Vec::with_capacity(primary_keys.len());
        for key in primary_keys {
            if let Some(row) = self.rows.remove(key) {
                self.unindex_row(&row);
                removed.push(row);
            }
        }

        debug!(table = %self.name, rows = removed.len(), "deleted rows");
        Ok(removed)
    }

    /// Primary keys of the rows matching `filter`; an empty filter matches
    /// every row.
    ///
    /// # Errors
    /// Returns [Error::ColumnNotFound] if a predicate names an unknown column.
    pub fn matching_keys(&self, filter: &WhereClause) -> Result<KeySet> {
        match filter.chain() {
            Some(chain) => PredicateEvaluator::new(self).evaluate_chain(chain),
            None => Ok(self.rows.keys().cloned().collect()),
        }
    }

    /// Copies of the rows matching `filter`, in primary key order.
    ///
    /// # Errors
    /// Returns [Error::ColumnNotFound] if a predicate names an unknown column.
    pub fn select_rows(&self, filter: &WhereClause) -> Result<Vec<Row>> {
        let Some(chain) = filter.chain() else {
            return Ok(self.rows.iter().cloned().collect());
        };

        let keys = PredicateEvaluator::new(self).evaluate_chain(chain)?;
        let rows = keys
            .iter()
            .filter_map(|key| match self.rows.get(key) {
                Some(row) => Some(row.clone()),
                None => {
                    warn!(table = %self.name, %key, "index refers to a missing row, skipping");
                    None
                }
            })
            .collect();
        Ok(rows)
    }

    /// Inserts previously removed rows again.
    ///
    /// # Errors
    /// Returns [Error::DuplicatePrimaryKey] if one of the keys is taken and
    /// [Error::ArityMismatch] if a row does not fit the schema; nothing is
    /// inserted in either case.
    pub(crate) fn restore_rows(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            if row.values().len() != self.schema.len() {
                return Err(Error::ArityMismatch {
                    expected: self.schema.len(),
                    found: row.values().len(),
                });
            }
            if self.rows.contains(row.primary_key()) {
                return Err(Error::DuplicatePrimaryKey(row.primary_key().to_string()));
            }
        }

        for row in rows {
            let row = Row::new(Arc::clone(&self.schema), row.values().to_vec());
            self.index_row(&row);
            self.rows.insert(row);
        }
        debug!(table = %self.name, rows = rows.len(), "restored rows");
        Ok(())
    }

    /// Puts `column` back to its value in `previous`, undoing an update that
    /// set it to `applied`.
    ///
    /// # Errors
    /// Fails without changing anything if a row is missing or a restored
    /// primary key is taken.
    pub(crate) fn revert_update(&mut self, column: &str, applied: &str, previous: &[Row]) -> Result<()> {
        let idx = self.column_position(column)?;
        // a primary key update moved the row to `applied`
        let current_key = |row: &Row| {
            if idx == 0 {
                applied.to_string()
            } else {
                row.primary_key().to_string()
            }
        };

        let current: KeySet = previous.iter().map(current_key).collect();
        self.check_rows_exist(&current)?;

        for row in previous {
            self.update_rows(&KeySet::from([current_key(row)]), column, &row.values()[idx])?;
        }
        Ok(())
    }

    /// Checks that the row store and every column index agree: each row is
    /// indexed under its current cell in every column, and each indexed key
    /// belongs to a row holding that cell.
    pub fn is_consistent(&self) -> bool {
        let rows_indexed = self.rows.iter().all(|row| {
            self.columns
                .iter()
                .zip(row.values())
                .all(|(column, value)| column.index().contains(value, row.primary_key()))
        });

        rows_indexed
            && self.columns.iter().enumerate().all(|(idx, column)| {
                let mut entries = 0;
                let mut valid = true;
                column
                    .index()
                    .scan_range(Bound::Unbounded, Bound::Unbounded, &mut |value, keys| {
                        entries += keys.len();
                        valid &= !keys.is_empty()
                            && keys.iter().all(|key| {
                                self.rows
                                    .get(key)
                                    .is_some_and(|row| row.values()[idx] == value)
                            });
                    });
                valid && entries == self.rows.len()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Operator, Predicate};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn keys(items: &[&str]) -> KeySet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn student_table(backend: IndexBackend) -> Table {
        let schema = Schema::new(strings(&["id", "name", "gpa", "age"])).unwrap();
        let mut table = Table::new("student".into(), schema, backend);
        table
            .insert_row(strings(&["1", "'John Doe'", "3.5", "20"]))
            .unwrap();
        table
            .insert_row(strings(&["2", "'Jane Smith'", "3.9", "19"]))
            .unwrap();
        table
            .insert_row(strings(&["3", "'Mark Davis'", "3.2", "21"]))
            .unwrap();
        table
            .insert_row(strings(&["4", "'Emma Wilson'", "3.8", "22"]))
            .unwrap();
        table
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(Row::primary_key).collect()
    }

    fn where_(column: &str, op: Operator, value: &str) -> WhereClause {
        WhereClause::new(Predicate::new(column, op, value))
    }

    #[test]
    fn test_schema_validation() {
        assert_eq!(Schema::new(vec![]), Err(Error::EmptyColumnList));
        assert_eq!(
            Schema::new(strings(&["id", "name", "id"])),
            Err(Error::DuplicateColumn("id".into()))
        );

        let schema = Schema::new(strings(&["id", "name"])).unwrap();
        assert_eq!(schema.primary_key(), "id");
        assert_eq!(schema.position("name"), Some(1));
        assert_eq!(schema.position("age"), None);
    }

    #[test]
    fn test_table_creation() {
        let schema = Schema::new(strings(&["id", "name"])).unwrap();
        let table = Table::new("users".into(), schema, IndexBackend::BTree);

        assert_eq!(table.name(), "users");
        assert_eq!(table.columns(), ["id", "name"]);
        assert_eq!(table.primary_key_column(), "id");
        assert!(table.is_empty());
        assert!(table.index("name").unwrap().is_empty());
        assert!(table.is_consistent());
    }

    #[test]
    fn test_insert_and_get() {
        for backend in [IndexBackend::BTree, IndexBackend::Avl] {
            let table = student_table(backend);

            assert_eq!(table.len(), 4);
            let row = table.get_row("2").unwrap();
            assert_eq!(row.values(), strings(&["2", "'Jane Smith'", "3.9", "19"]));
            assert_eq!(table.index("age").unwrap().exact("19"), keys(&["2"]));
            assert_eq!(table.index("id").unwrap().exact("2"), keys(&["2"]));
            assert!(table.is_consistent());
        }
    }

    #[test]
    fn test_insert_round_trip() {
        let mut table = student_table(IndexBackend::BTree);
        table
            .insert_row(strings(&["5", "'Li Wei'", "3.1", "23"]))
            .unwrap();

        let rows = table
            .select_rows(&where_("id", Operator::Eq, "5"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), strings(&["5", "'Li Wei'", "3.1", "23"]));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut table = student_table(IndexBackend::BTree);

        let result = table.insert_row(strings(&["5", "'Li Wei'"]));
        assert_eq!(
            result,
            Err(Error::ArityMismatch {
                expected: 4,
                found: 2
            })
        );

        let result = table.insert_row(vec![]);
        assert!(result.is_err());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_duplicate_primary_key_leaves_table_unchanged() {
        let mut table = student_table(IndexBackend::Avl);
        let before = table.index("gpa").unwrap().entries();

        let result = table.insert_row(strings(&["1", "'Someone Else'", "2.0", "30"]));

        assert_eq!(result, Err(Error::DuplicatePrimaryKey("1".into())));
        assert_eq!(table.len(), 4);
        assert_eq!(table.index("gpa").unwrap().entries(), before);
        assert!(table.index("gpa").unwrap().get("2.0").is_none());
        assert!(table.is_consistent());
    }

    #[test]
    fn test_select_all() {
        let table = student_table(IndexBackend::BTree);

        let rows = table.select_rows(&WhereClause::all()).unwrap();
        assert_eq!(ids(&rows), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_select_where() {
        let table = student_table(IndexBackend::BTree);

        let rows = table
            .select_rows(&where_("gpa", Operator::Gt, "3.5"))
            .unwrap();
        assert_eq!(ids(&rows), vec!["2", "4"]);

        let rows = table
            .select_rows(&where_("age", Operator::Lt, "21"))
            .unwrap();
        assert_eq!(ids(&rows), vec!["1", "2"]);

        let rows = table
            .select_rows(&where_("name", Operator::Eq, "'Mark Davis'"))
            .unwrap();
        assert_eq!(ids(&rows), vec!["3"]);

        let rows = table
            .select_rows(&where_("age", Operator::Gt, "9"))
            .unwrap();
        assert_eq!(ids(&rows), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_select_unknown_column() {
        let table = student_table(IndexBackend::BTree);

        let result = table.select_rows(&where_("major", Operator::Eq, "cs"));
        assert_eq!(result, Err(Error::ColumnNotFound("major".into())));
    }

    #[test]
    fn test_update_reindexes() {
        for backend in [IndexBackend::BTree, IndexBackend::Avl] {
            let mut table = student_table(backend);

            let previous = table.update_rows(&keys(&["1"]), "gpa", "4.0").unwrap();

            assert_eq!(previous.len(), 1);
            assert_eq!(previous[0].get("gpa"), Some("3.5"));
            assert_eq!(table.get_row("1").unwrap().get("gpa"), Some("4.0"));
            assert!(table.index("gpa").unwrap().get("3.5").is_none());
            assert_eq!(table.index("gpa").unwrap().exact("4.0"), keys(&["1"]));

            let old = table
                .select_rows(&where_("gpa", Operator::Eq, "3.5"))
                .unwrap();
            assert!(old.is_empty());
            let new = table
                .select_rows(&where_("gpa", Operator::Eq, "4.0"))
                .unwrap();
            assert_eq!(ids(&new), vec!["1"]);
            assert!(table.is_consistent());
        }
    }

    #[test]
    fn test_update_many_rows_into_one_bucket() {
        let mut table = student_table(IndexBackend::BTree);

        let previous = table
            .update_rows(&keys(&["1", "2", "3"]), "age", "30")
            .unwrap();

        assert_eq!(ids(&previous), vec!["1", "2", "3"]);
        assert_eq!(table.index("age").unwrap().exact("30"), keys(&["1", "2", "3"]));
        assert_eq!(table.index("age").unwrap().distinct_values(), 2);
        assert!(table.is_consistent());
    }

    #[test]
    fn test_update_errors_leave_table_unchanged() {
        let mut table = student_table(IndexBackend::BTree);

        assert_eq!(
            table.update_rows(&keys(&["1"]), "major", "cs"),
            Err(Error::ColumnNotFound("major".into()))
        );
        assert_eq!(
            table.update_rows(&keys(&["1", "9"]), "gpa", "4.0"),
            Err(Error::RowNotFound("9".into()))
        );
        assert_eq!(table.get_row("1").unwrap().get("gpa"), Some("3.5"));
        assert!(table.index("gpa").unwrap().get("4.0").is_none());
        assert!(table.is_consistent());
    }

    #[test]
    fn test_update_primary_key_moves_row() {
        let mut table = student_table(IndexBackend::Avl);

        let previous = table.update_rows(&keys(&["1"]), "id", "10").unwrap();

        assert_eq!(ids(&previous), vec!["1"]);
        assert!(table.get_row("1").is_none());
        assert_eq!(table.get_row("10").unwrap().get("name"), Some("'John Doe'"));
        assert_eq!(table.index("gpa").unwrap().exact("3.5"), keys(&["10"]));
        assert!(table.is_consistent());
    }

    #[test]
    fn test_update_primary_key_collisions() {
        let mut table = student_table(IndexBackend::BTree);

        assert_eq!(
            table.update_rows(&keys(&["1"]), "id", "2"),
            Err(Error::DuplicatePrimaryKey("2".into()))
        );
        assert_eq!(
            table.update_rows(&keys(&["1", "2"]), "id", "10"),
            Err(Error::DuplicatePrimaryKey("10".into()))
        );
        // same key is a no-op
        table.update_rows(&keys(&["1"]), "id", "1").unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.is_consistent());
    }

    #[test]
    fn test_delete_removes_from_every_index() {
        for backend in [IndexBackend::BTree, IndexBackend::Avl] {
            let mut table = student_table(backend);

            let removed = table.delete_rows(&keys(&["2"])).unwrap();

            assert_eq!(ids(&removed), vec!["2"]);
            assert_eq!(table.len(), 3);
            assert!(
                table
                    .select_rows(&where_("id", Operator::Eq, "2"))
                    .unwrap()
                    .is_empty()
            );
            for column in table.columns() {
                let index = table.index(column).unwrap();
                assert!(index.entries().iter().all(|(_, keys)| !keys.contains("2")));
            }
            assert!(table.index("age").unwrap().get("19").is_none());
            assert!(table.is_consistent());
        }
    }

    #[test]
    fn test_delete_missing_row_removes_nothing() {
        let mut table = student_table(IndexBackend::BTree);

        let result = table.delete_rows(&keys(&["1", "42"]));

        assert_eq!(result, Err(Error::RowNotFound("42".into())));
        assert_eq!(table.len(), 4);
        assert!(table.is_consistent());
    }

    #[test]
    fn test_restore_rows() {
        let mut table = student_table(IndexBackend::BTree);
        let before = table.index("name").unwrap().entries();

        let removed = table.delete_rows(&keys(&["1", "3"])).unwrap();
        table.restore_rows(&removed).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.index("name").unwrap().entries(), before);
        assert!(table.is_consistent());

        assert_eq!(
            table.restore_rows(&removed),
            Err(Error::DuplicatePrimaryKey("1".into()))
        );
    }

    #[test]
    fn test_revert_update() {
        let mut table = student_table(IndexBackend::Avl);
        let before: Vec<Row> = table.rows().cloned().collect();

        let previous = table
            .update_rows(&keys(&["1", "4"]), "age", "50")
            .unwrap();
        table.revert_update("age", "50", &previous).unwrap();

        assert_eq!(table.rows().cloned().collect::<Vec<_>>(), before);
        assert!(table.index("age").unwrap().get("50").is_none());
        assert!(table.is_consistent());
    }

    #[test]
    fn test_revert_primary_key_update() {
        let mut table = student_table(IndexBackend::BTree);

        let previous = table.update_rows(&keys(&["3"]), "id", "30").unwrap();
        table.revert_update("id", "30", &previous).unwrap();

        assert!(table.get_row("30").is_none());
        assert_eq!(table.get_row("3").unwrap().get("name"), Some("'Mark Davis'"));
        assert!(table.is_consistent());
    }

    #[test]
    fn test_allocated_bytes_grows_with_rows() {
        let mut table = student_table(IndexBackend::BTree);
        let before = table.allocated_bytes();

        for i in 10..60 {
            let id = i.to_string();
            table
                .insert_row(strings(&[id.as_str(), "'Student'", "3.0", "20"]))
                .unwrap();
        }

        assert!(table.allocated_bytes() > before);
    }
}
