//! Ordered column indexes.
//!
//! Every column of a table owns one index mapping each distinct cell value to
//! the set of primary keys whose row currently holds that value. The
//! [OrderedIndex] trait describes what the engine needs from such an index;
//! backends only provide ordered storage and traversal, while the comparison
//! policy of range queries lives in the trait's provided methods so that all
//! backends answer queries identically.

mod avl;
mod btree;

use std::collections::BTreeSet;
use std::ops::Bound;

use allocative::Allocative;

use crate::ast::Operator;
use crate::config::IndexBackend;
use crate::value::{self, Value};

pub use avl::AvlIndex;
pub use btree::BTreeIndex;

/// A set of primary keys, ordered by their text.
pub type KeySet = BTreeSet<String>;

/// Sorted mapping from a column value to the primary keys holding it.
///
/// Values are ordered by their raw text. Entries whose key set becomes empty
/// are removed immediately.
pub trait OrderedIndex {
    /// Adds `primary_key` to the set stored at `value`.
    fn insert(&mut self, value: &str, primary_key: &str);

    /// Removes `primary_key` from the set stored at `value`, dropping the
    /// entry once its set is empty. Removing an absent pair is a no-op.
    fn remove(&mut self, value: &str, primary_key: &str);

    /// Returns the key set stored at exactly `value`.
    fn get(&self, value: &str) -> Option<&KeySet>;

    /// Calls `visitor` for every entry whose value lies within the bounds,
    /// in ascending text order.
    fn scan_range(&self, lower: Bound<&str>, upper: Bound<&str>, visitor: &mut dyn FnMut(&str, &KeySet));

    /// Number of distinct values currently indexed.
    fn distinct_values(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.distinct_values() == 0
    }

    fn contains(&self, value: &str, primary_key: &str) -> bool {
        self.get(value).is_some_and(|keys| keys.contains(primary_key))
    }

    /// Primary keys of rows whose cell is textually equal to `value`.
    fn exact(&self, value: &str) -> KeySet {
        self.get(value).cloned().unwrap_or_default()
    }

    /// Primary keys of rows whose cell satisfies `cell <op> literal`.
    ///
    /// `=` and `!=` match on the exact text. The four relational operators
    /// compare numerically when the literal and the cell both parse as
    /// numbers, and lexicographically otherwise. A non-numeric literal is
    /// answered with an ordered range scan; a numeric literal has to look at
    /// every entry because the index is kept in text order.
    fn range(&self, op: Operator, literal: &str) -> KeySet {
        if op == Operator::Eq {
            return self.exact(literal);
        }

        let numeric = Value::parse(literal).is_number();
        let (lower, upper) = match op {
            Operator::Eq | Operator::NotEq => (Bound::Unbounded, Bound::Unbounded),
            _ if numeric => (Bound::Unbounded, Bound::Unbounded),
            Operator::Lt => (Bound::Unbounded, Bound::Excluded(literal)),
            Operator::LtEq => (Bound::Unbounded, Bound::Included(literal)),
            Operator::Gt => (Bound::Excluded(literal), Bound::Unbounded),
            Operator::GtEq => (Bound::Included(literal), Bound::Unbounded),
        };

        let mut matches = KeySet::new();
        self.scan_range(lower, upper, &mut |value, keys| {
            let keep = match op {
                Operator::NotEq => value != literal,
                _ if numeric => op.accepts(value::compare(value, literal)),
                _ => true,
            };
            if keep {
                matches.extend(keys.iter().cloned());
            }
        });
        matches
    }

    /// Every entry in ascending text order.
    fn entries(&self) -> Vec<(String, KeySet)> {
        let mut entries = Vec::with_capacity(self.distinct_values());
        self.scan_range(Bound::Unbounded, Bound::Unbounded, &mut |value, keys| {
            entries.push((value.to_string(), keys.clone()));
        });
        entries
    }
}

/// Returns `true` for bounds that cannot contain any value, e.g. `("b", "a")`.
pub(crate) fn is_empty_range(lower: Bound<&str>, upper: Bound<&str>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l > u,
        (Bound::Included(l), Bound::Excluded(u)) | (Bound::Excluded(l), Bound::Included(u)) => l >= u,
        (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
        _ => false,
    }
}

/// The index of one table column, backed by the configured implementation.
#[derive(Debug, Clone, Allocative)]
pub enum ColumnIndex {
    BTree(BTreeIndex),
    Avl(AvlIndex),
}

impl ColumnIndex {
    pub fn new(backend: IndexBackend) -> Self {
        match backend {
            IndexBackend::BTree => Self::BTree(BTreeIndex::default()),
            IndexBackend::Avl => Self::Avl(AvlIndex::default()),
        }
    }

    pub fn backend(&self) -> IndexBackend {
        match self {
            Self::BTree(_) => IndexBackend::BTree,
            Self::Avl(_) => IndexBackend::Avl,
        }
    }
}

impl OrderedIndex for ColumnIndex {
    fn insert(&mut self, value: &str, primary_key: &str) {
        match self {
            Self::BTree(index) => index.insert(value, primary_key),
            Self::Avl(index) => index.insert(value, primary_key),
        }
    }

    fn remove(&mut self, value: &str, primary_key: &str) {
        match self {
            Self::BTree(index) => index.remove(value, primary_key),
            Self::Avl(index) => index.remove(value, primary_key),
        }
    }

    fn get(&self, value: &str) -> Option<&KeySet> {
        match self {
            Self::BTree(index) => index.get(value),
            Self::Avl(index) => index.get(value),
        }
    }

    fn scan_range(&self, lower: Bound<&str>, upper: Bound<&str>, visitor: &mut dyn FnMut(&str, &KeySet)) {
        match self {
            Self::BTree(index) => index.scan_range(lower, upper, visitor),
            Self::Avl(index) => index.scan_range(lower, upper, visitor),
        }
    }

    fn distinct_values(&self) -> usize {
        match self {
            Self::BTree(index) => index.distinct_values(),
            Self::Avl(index) => index.distinct_values(),
        }
    }
}
