use std::collections::BTreeMap;
use std::ops::Bound;

use allocative::Allocative;

use super::{KeySet, OrderedIndex, is_empty_range};

/// Column index backed by the standard library's B-tree map.
#[derive(Debug, Clone, Default, Allocative)]
pub struct BTreeIndex {
    entries: BTreeMap<String, KeySet>,
}

impl OrderedIndex for BTreeIndex {
    fn insert(&mut self, value: &str, primary_key: &str) {
        match self.entries.get_mut(value) {
            Some(keys) => {
                keys.insert(primary_key.to_string());
            }
            None => {
                self.entries
                    .insert(value.to_string(), KeySet::from([primary_key.to_string()]));
            }
        }
    }

    fn remove(&mut self, value: &str, primary_key: &str) {
        let Some(keys) = self.entries.get_mut(value) else {
            return;
        };
        keys.remove(primary_key);
        if keys.is_empty() {
            self.entries.remove(value);
        }
    }

    fn get(&self, value: &str) -> Option<&KeySet> {
        self.entries.get(value)
    }

    fn scan_range(&self, lower: Bound<&str>, upper: Bound<&str>, visitor: &mut dyn FnMut(&str, &KeySet)) {
        // BTreeMap::range panics on inverted bounds
        if is_empty_range(lower, upper) {
            return;
        }
        for (value, keys) in self.entries.range::<str, _>((lower, upper)) {
            visitor(value, keys);
        }
    }

    fn distinct_values(&self) -> usize {
        self.entries.len()
    }
}
