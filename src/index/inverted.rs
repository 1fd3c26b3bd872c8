use std::collections::{BTreeSet, HashMap};

use crate::core::types::DocId;

/// Token → document-id multimap layered over the trie for O(1) exact-term
/// membership tests (spec §4.2). Must be kept in lock-step with the trie:
/// every mutation that touches the trie touches this map in the same call.
#[derive(Debug, Default, Clone)]
pub struct InvertedMap {
    tokens: HashMap<String, BTreeSet<DocId>>,
}

impl InvertedMap {
    pub fn new() -> Self {
        InvertedMap {
            tokens: HashMap::new(),
        }
    }

    pub fn insert(&mut self, token: &str, doc_id: DocId) {
        self.tokens
            .entry(token.to_lowercase())
            .or_default()
            .insert(doc_id);
    }

    /// Remove `doc_id` from every token it is registered under. Empty
    /// entries are dropped so `tokens` never holds dangling empty sets.
    pub fn remove_doc(&mut self, doc_id: &DocId) {
        self.tokens.retain(|_, docs| {
            docs.remove(doc_id);
            !docs.is_empty()
        });
    }

    pub fn contains(&self, token: &str, doc_id: &DocId) -> bool {
        self.tokens
            .get(&token.to_lowercase())
            .is_some_and(|docs| docs.contains(doc_id))
    }

    pub fn docs_for(&self, token: &str) -> Option<&BTreeSet<DocId>> {
        self.tokens.get(&token.to_lowercase())
    }

    /// Sorted `{token: [docId, ...]}` view used by the snapshot format
    /// (spec §6 `dataMap`), sorted for determinism.
    pub fn to_sorted_map(&self) -> std::collections::BTreeMap<String, Vec<DocId>> {
        self.tokens
            .iter()
            .map(|(token, docs)| (token.clone(), docs.iter().cloned().collect()))
            .collect()
    }

    pub fn from_sorted_map(map: std::collections::BTreeMap<String, Vec<DocId>>) -> Self {
        let tokens = map
            .into_iter()
            .map(|(token, docs)| (token, docs.into_iter().collect()))
            .collect();
        InvertedMap { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains() {
        let mut map = InvertedMap::new();
        map.insert("Hello", DocId::new("a"));
        assert!(map.contains("hello", &DocId::new("a")));
        assert!(!map.contains("hello", &DocId::new("b")));
    }

    #[test]
    fn remove_doc_drops_empty_entries() {
        let mut map = InvertedMap::new();
        map.insert("hello", DocId::new("a"));
        map.remove_doc(&DocId::new("a"));
        assert!(map.docs_for("hello").is_none());
        assert!(map.is_empty());
    }
}
