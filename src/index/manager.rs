use std::collections::HashMap;

use crate::core::config::VersioningConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document, DocumentVersion};
use crate::index::inverted::InvertedMap;
use crate::index::mapper::{IndexMapper, MatchedDoc};
use crate::index::snapshot::{
    deserialize_trie, serialize_trie, DocumentEntry, IndexState, Snapshot, SnapshotConfig,
};
use crate::trie::Trie;

/// Owns the canonical document store plus the trie/inverted-map pair that
/// index it, and drives `IndexMapper` across every configured field (spec
/// §4.4). Grounded on the teacher's `core::database::Database`: an
/// insertion-ordered id list next to a lookup map, mirroring
/// `Database`'s `documents: Vec<_>` + `index: HashMap<_, usize>` split.
pub struct IndexManager {
    name: String,
    mapper: IndexMapper,
    versioning: VersioningConfig,
    trie: Trie,
    inverted: InvertedMap,
    order: Vec<DocId>,
    by_id: HashMap<DocId, usize>,
    documents: HashMap<DocId, Document>,
    next_ordinal: u64,
}

impl IndexManager {
    pub fn new(name: impl Into<String>, fields: Vec<String>, max_word_length: usize) -> Self {
        IndexManager {
            name: name.into(),
            mapper: IndexMapper::new(fields, max_word_length),
            versioning: VersioningConfig::default(),
            trie: Trie::new(),
            inverted: InvertedMap::new(),
            order: Vec::new(),
            by_id: HashMap::new(),
            documents: HashMap::new(),
            next_ordinal: 0,
        }
    }

    pub fn with_versioning(mut self, versioning: VersioningConfig) -> Self {
        self.versioning = versioning;
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &DocId) -> Option<&Document> {
        self.documents.get(id)
    }

    /// `{indexName}-{ordinal}-{epoch-ms}` (spec §3) for documents arriving
    /// without a caller-supplied id.
    pub fn allocate_id(&mut self, now_ms: i64) -> DocId {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        DocId::new(format!("{}-{}-{}", self.name, ordinal, now_ms))
    }

    /// Insert a brand-new document: index its fields and record it in
    /// insertion order. Fully indexes or fully skips — never partially
    /// (spec §7: "a failed insert must either have fully indexed the
    /// document or not touched the trie/map at all").
    pub fn add_document(&mut self, doc: Document, now_ms: i64) -> Result<()> {
        if self.by_id.contains_key(&doc.id) {
            return Err(Error::validation(format!(
                "document '{}' already exists",
                doc.id
            )));
        }
        self.mapper
            .index_document(&mut self.trie, &mut self.inverted, &doc, now_ms);
        self.by_id.insert(doc.id.clone(), self.order.len());
        self.order.push(doc.id.clone());
        self.documents.insert(doc.id.clone(), doc);
        Ok(())
    }

    /// Remove `id` from trie, map, and document store (spec §4.4
    /// `removeDocument`). `NotFound` if absent.
    pub fn remove_document(&mut self, id: &DocId) -> Result<Document> {
        let Some(&position) = self.by_id.get(id) else {
            return Err(Error::not_found(format!("document '{id}' not found")));
        };
        self.trie.remove_doc(id);
        self.inverted.remove_doc(id);
        self.order.remove(position);
        self.by_id.remove(id);
        for idx in self.by_id.values_mut() {
            if *idx > position {
                *idx -= 1;
            }
        }
        Ok(self.documents.remove(id).expect("tracked document present"))
    }

    /// Remove the prior version from trie/map, re-index the replacement,
    /// and (if versioning is enabled *and* the content actually changed)
    /// push the prior content onto the version history, FIFO-capped
    /// (spec §4.4: versions are pushed "when content changes and
    /// versioning is enabled" — a no-op update must not manufacture a
    /// spurious entry that could evict real history once `max_versions`
    /// is hit).
    pub fn update_document(&mut self, id: &DocId, new_doc: Document, now_ms: i64) -> Result<()> {
        let Some(previous) = self.documents.get(id).cloned() else {
            return Err(Error::not_found(format!("document '{id}' not found")));
        };

        self.trie.remove_doc(id);
        self.inverted.remove_doc(id);
        self.mapper
            .index_document(&mut self.trie, &mut self.inverted, &new_doc, now_ms);

        let mut replacement = new_doc;
        if self.versioning.enabled && replacement.fields != previous.fields {
            let mut versions = previous.versions.clone();
            versions.push(DocumentVersion {
                version: versions.len() as u32 + 1,
                content: crate::core::types::Value::Map(previous.fields.clone()),
                modified: chrono::Utc::now(),
                author: None,
            });
            while versions.len() > self.versioning.max_versions {
                versions.remove(0);
            }
            replacement.versions = versions;
        } else {
            replacement.versions = previous.versions;
        }
        self.documents.insert(id.clone(), replacement);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn search(
        &self,
        terms: &[String],
        phrases: &[String],
        fuzzy: bool,
        max_distance: usize,
        max_results: usize,
        now_ms: i64,
    ) -> Vec<MatchedDoc> {
        let total_docs = self.order.len().max(1);
        let by_id = &self.by_id;
        let order = &self.order;
        let documents = &self.documents;
        let mapper_ref = &self.mapper;
        self.mapper.search(
            &self.trie,
            &self.inverted,
            terms,
            phrases,
            fuzzy,
            max_distance,
            max_results,
            total_docs,
            now_ms,
            |id| documents.get(id).map(|d| mapper_ref.field_text(d)),
            |id| *by_id.get(id).unwrap_or(&order.len()),
        )
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn inverted(&self) -> &InvertedMap {
        &self.inverted
    }

    /// Produce the bit-exact snapshot payload from spec §6.
    pub fn export(&self) -> Snapshot {
        let documents = self
            .order
            .iter()
            .map(|id| DocumentEntry {
                key: id.clone(),
                value: self.documents[id].clone(),
            })
            .collect();
        Snapshot {
            documents,
            index_state: IndexState {
                trie: serialize_trie(&self.trie, self.trie.root()),
                data_map: self.inverted.to_sorted_map(),
            },
            config: SnapshotConfig {
                name: self.name.clone(),
                version: 1,
                fields: self.mapper.fields.clone(),
            },
        }
    }

    /// Replace this manager's entire state from a snapshot atomically:
    /// either every field below is replaced, or (on shape error) none of
    /// them are (spec §4.4: "partial import is not allowed").
    pub fn import(&mut self, snapshot: Snapshot) {
        let trie = deserialize_trie(&snapshot.index_state.trie);
        let inverted = InvertedMap::from_sorted_map(snapshot.index_state.data_map);

        let mut order = Vec::with_capacity(snapshot.documents.len());
        let mut by_id = HashMap::with_capacity(snapshot.documents.len());
        let mut documents = HashMap::with_capacity(snapshot.documents.len());
        for (idx, entry) in snapshot.documents.into_iter().enumerate() {
            order.push(entry.key.clone());
            by_id.insert(entry.key.clone(), idx);
            documents.insert(entry.key, entry.value);
        }

        self.trie = trie;
        self.inverted = inverted;
        self.order = order;
        self.by_id = by_id;
        self.documents = documents;
        self.mapper = IndexMapper::new(snapshot.config.fields, self.mapper.max_word_length);
        self.name = snapshot.config.name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Value;

    fn doc(id: &str, title: &str) -> Document {
        Document::new(DocId::new(id)).with_field("title", Value::Text(title.to_string()))
    }

    #[test]
    fn add_then_search_finds_document() {
        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50);
        manager.add_document(doc("a", "Hello world"), 0).unwrap();
        let results = manager.search(&["hello".to_string()], &[], false, 0, 10, 0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, DocId::new("a"));
    }

    #[test]
    fn remove_document_clears_term_visibility() {
        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50);
        manager.add_document(doc("a", "Hello world"), 0).unwrap();
        manager.remove_document(&DocId::new("a")).unwrap();
        assert!(manager
            .search(&["hello".to_string()], &[], false, 0, 10, 0)
            .is_empty());
    }

    #[test]
    fn remove_missing_document_is_not_found() {
        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50);
        let err = manager.remove_document(&DocId::new("missing")).unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::NotFound);
    }

    #[test]
    fn stemmed_query_terms_find_documents_stored_in_other_inflections() {
        use crate::analysis::stem;

        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50);
        manager
            .add_document(doc("c", "running fast"), 0)
            .unwrap();

        // "run" and "runs" both stem to "run", which is what the trie holds
        // for the indexed "running".
        for query_term in ["run", "runs"] {
            let hits = manager.search(&[stem(query_term)], &[], false, 0, 10, 0);
            assert_eq!(hits.len(), 1, "query {query_term:?} should match");
            assert_eq!(hits[0].doc_id, DocId::new("c"));
        }
    }

    #[test]
    fn snapshot_round_trips_search_answers() {
        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50);
        manager.add_document(doc("a", "Hello world"), 0).unwrap();
        manager.add_document(doc("b", "Hello there"), 0).unwrap();

        let before = manager.search(&["hello".to_string()], &[], false, 0, 10, 0);
        let snapshot = manager.export();

        let mut restored = IndexManager::new("idx", vec!["title".to_string()], 50);
        restored.import(snapshot);
        let after = restored.search(&["hello".to_string()], &[], false, 0, 10, 0);

        let before_ids: Vec<_> = before.iter().map(|m| m.doc_id.clone()).collect();
        let after_ids: Vec<_> = after.iter().map(|m| m.doc_id.clone()).collect();
        assert_eq!(before_ids, after_ids);
    }

    #[test]
    fn update_with_unchanged_content_does_not_record_a_version() {
        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50)
            .with_versioning(VersioningConfig {
                enabled: true,
                max_versions: 10,
            });
        manager.add_document(doc("a", "Hello world"), 0).unwrap();

        manager
            .update_document(&DocId::new("a"), doc("a", "Hello world"), 1)
            .unwrap();

        assert!(manager.get(&DocId::new("a")).unwrap().versions.is_empty());
    }

    #[test]
    fn update_with_changed_content_records_exactly_one_version() {
        let mut manager = IndexManager::new("idx", vec!["title".to_string()], 50)
            .with_versioning(VersioningConfig {
                enabled: true,
                max_versions: 10,
            });
        manager.add_document(doc("a", "Hello world"), 0).unwrap();

        manager
            .update_document(&DocId::new("a"), doc("a", "Hello there"), 1)
            .unwrap();

        assert_eq!(manager.get(&DocId::new("a")).unwrap().versions.len(), 1);
    }
}
