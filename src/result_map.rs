//! Keyed, mergeable result storage

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Shallow field-wise merge: fields set in `other` overwrite, unset fields are kept
pub trait Merge {
    fn merge(&mut self, other: Self);
}

/// Map whose entries start from a default value and absorb partial updates
#[derive(Debug, Clone)]
pub struct ResultMap<K, V> {
    map: BTreeMap<K, V>,
    default_value: V,
}

impl<K: Ord, V: Clone + Merge> ResultMap<K, V> {
    pub fn new(default_value: V) -> Self {
        Self {
            map: BTreeMap::new(),
            default_value,
        }
    }

    /// Entry for `key`, inserting a copy of the default value if absent
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V {
        let default_value = &self.default_value;
        self.map.entry(key).or_insert_with(|| default_value.clone())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn set(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    pub fn has(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Merge `partial` into the entry for `key`, creating it first if needed
    pub fn merge(&mut self, key: K, partial: V) {
        self.get_or_insert_default(key).merge(partial);
    }

    /// Entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Serialize, V: Serialize> Serialize for ResultMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.map.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Fields {
        a: Option<u32>,
        b: Option<u32>,
    }

    impl Merge for Fields {
        fn merge(&mut self, other: Self) {
            if other.a.is_some() {
                self.a = other.a;
            }
            if other.b.is_some() {
                self.b = other.b;
            }
        }
    }

    #[test]
    fn test_merge_creates_from_default() {
        let mut map = ResultMap::new(Fields {
            a: Some(0),
            b: None,
        });
        map.merge("x", Fields { a: None, b: Some(2) });

        assert_eq!(map.get(&"x"), Some(&Fields { a: Some(0), b: Some(2) }));
    }

    #[test]
    fn test_disjoint_merges_commute() {
        let first = Fields { a: Some(1), b: None };
        let second = Fields { a: None, b: Some(2) };

        let mut forward = ResultMap::new(Fields::default());
        forward.merge("k", first.clone());
        forward.merge("k", second.clone());

        let mut backward = ResultMap::new(Fields::default());
        backward.merge("k", second);
        backward.merge("k", first);

        assert_eq!(forward.get(&"k"), backward.get(&"k"));
    }

    #[test]
    fn test_overlapping_merge_last_write_wins() {
        let mut map = ResultMap::new(Fields::default());
        map.merge("k", Fields { a: Some(1), b: Some(1) });
        map.merge("k", Fields { a: Some(5), b: None });

        assert_eq!(map.get(&"k"), Some(&Fields { a: Some(5), b: Some(1) }));
    }

    #[test]
    fn test_len_counts_distinct_keys() {
        let mut map = ResultMap::new(Fields::default());
        map.merge("a", Fields::default());
        map.merge("b", Fields::default());
        map.merge("a", Fields { a: Some(3), b: None });

        assert_eq!(map.len(), 2);
        assert!(map.has(&"a"));
        assert!(!map.has(&"c"));
        let keys: Vec<_> = map.entries().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_get_or_insert_default_does_not_alias() {
        let mut map = ResultMap::new(Fields::default());
        map.get_or_insert_default("a").a = Some(9);

        assert_eq!(map.get_or_insert_default("b"), &mut Fields::default());
        map.set("c", Fields { a: None, b: Some(4) });
        assert_eq!(map.len(), 3);
    }
}
