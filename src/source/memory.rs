//! In-memory raw-path store.
//!
//! Keeps records in a `BTreeMap` keyed by distinguishing path, which makes
//! lexicographic (nested-grouping) iteration free. Insertion order is kept
//! separately and serves as the "native" arbitrary order. DTD order is
//! produced by a caller-supplied comparator, falling back to lexicographic
//! when none is set.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{PathOrder, RawStore};

type Comparator = Box<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

struct StoredRecord {
    value: String,
    /// Fully attributed form; `None` when it equals the distinguishing path.
    full_path: Option<String>,
}

/// A [`RawStore`] holding all records in memory.
#[derive(Default)]
pub struct MemoryStore {
    records: BTreeMap<String, StoredRecord>,
    insertion: Vec<String>,
    dtd_comparator: Option<Comparator>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store a record whose fully attributed form equals its
    /// distinguishing path. Replaces any existing record at that path.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.insert_record(path.into(), value.into(), None);
    }

    /// Store a record together with its fully attributed form.
    pub fn insert_full(
        &mut self,
        path: impl Into<String>,
        full_path: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.insert_record(path.into(), value.into(), Some(full_path.into()));
    }

    fn insert_record(&mut self, path: String, value: String, full_path: Option<String>) {
        if !self.records.contains_key(&path) {
            self.insertion.push(path.clone());
        }
        self.records.insert(path, StoredRecord { value, full_path });
    }

    /// Set the comparator backing [`PathOrder::Dtd`] iteration.
    pub fn set_dtd_comparator(
        &mut self,
        cmp: impl Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    ) {
        self.dtd_comparator = Some(Box::new(cmp));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RawStore for MemoryStore {
    fn paths(&self, order: PathOrder) -> Box<dyn Iterator<Item = String> + '_> {
        match order {
            PathOrder::Arbitrary => Box::new(self.insertion.iter().cloned()),
            PathOrder::NestedGrouping => Box::new(self.records.keys().cloned()),
            PathOrder::Dtd => {
                let mut keys: Vec<String> = self.records.keys().cloned().collect();
                if let Some(cmp) = &self.dtd_comparator {
                    keys.sort_by(|a, b| cmp(a, b));
                }
                Box::new(keys.into_iter())
            }
        }
    }

    fn string_value(&self, path: &str) -> Option<String> {
        self.records.get(path).map(|r| r.value.clone())
    }

    fn full_path(&self, path: &str) -> Option<String> {
        self.records.get(path).map(|r| match &r.full_path {
            Some(full) => full.clone(),
            None => path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut store = MemoryStore::new();
        store.insert("//ldml/a", "1");
        assert_eq!(store.string_value("//ldml/a"), Some("1".to_string()));
        assert_eq!(store.string_value("//ldml/b"), None);
        assert_eq!(store.full_path("//ldml/a"), Some("//ldml/a".to_string()));
    }

    #[test]
    fn test_full_path_stored_separately() {
        let mut store = MemoryStore::new();
        store.insert_full("//ldml/a", "//ldml/a[@references=\"R\"]", "1");
        assert_eq!(
            store.full_path("//ldml/a"),
            Some("//ldml/a[@references=\"R\"]".to_string())
        );
    }

    #[test]
    fn test_replace_keeps_insertion_order() {
        let mut store = MemoryStore::new();
        store.insert("//ldml/b", "1");
        store.insert("//ldml/a", "2");
        store.insert("//ldml/b", "3");
        assert_eq!(store.len(), 2);
        let order: Vec<String> = store.paths(PathOrder::Arbitrary).collect();
        assert_eq!(order, ["//ldml/b", "//ldml/a"]);
        assert_eq!(store.string_value("//ldml/b"), Some("3".to_string()));
    }

    #[test]
    fn test_nested_grouping_sorts_keys() {
        let mut store = MemoryStore::new();
        store.insert("//ldml/b", "1");
        store.insert("//ldml/a", "2");
        let order: Vec<String> = store.paths(PathOrder::NestedGrouping).collect();
        assert_eq!(order, ["//ldml/a", "//ldml/b"]);
    }

    #[test]
    fn test_dtd_order_defaults_to_lexicographic() {
        let mut store = MemoryStore::new();
        store.insert("//ldml/b", "1");
        store.insert("//ldml/a", "2");
        let order: Vec<String> = store.paths(PathOrder::Dtd).collect();
        assert_eq!(order, ["//ldml/a", "//ldml/b"]);
    }
}
