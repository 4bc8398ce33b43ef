//! Ordered key vocabularies.

use std::collections::HashMap;
use std::hash::Hash;

/// An ordered set of keys with O(1) key → index lookup.
///
/// Insertion order is preserved; duplicates are dropped on construction.
/// Table rows and columns are addressed by vocabulary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary<K: Eq + Hash> {
    keys: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> Vocabulary<K> {
    /// Build a vocabulary from keys, keeping the first occurrence of each.
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<K>,
    {
        let mut out = Self::default();
        for key in keys {
            let key = key.into();
            if !out.index.contains_key(&key) {
                out.index.insert(key.clone(), out.keys.len());
                out.keys.push(key);
            }
        }
        out
    }

    /// Index of a key.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<usize>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(key).copied()
    }

    /// Whether the key is present.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Key at an index.
    #[inline]
    pub fn key(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    /// All keys in order.
    #[inline]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate `(index, key)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &K)> {
        self.keys.iter().enumerate()
    }
}

impl<K: Eq + Hash> Default for Vocabulary<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
        }

    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let v: Vocabulary<String> = Vocabulary::new(["b", "a", "b", "c"]);
        assert_eq!(v.keys(), ["b", "a", "c"]);
        assert_eq!(v.get("a"), Some(1));
        assert_eq!(v.get("z"), None);
        assert_eq!(v.key(2).map(String::as_str), Some("c"));
        assert!(v.contains("c"));
    }

    #[test]
    fn empty() {
        let v: Vocabulary<String> = Vocabulary::default();
        assert!(v.is_empty());
        assert_eq!(v.len(), 0);
    }
}
