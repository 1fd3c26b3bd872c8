use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::trie::{NodeId, Trie};

/// Wire form of a single trie node (spec §6 `SerializedNode`). Field names
/// match the snapshot JSON shape exactly so round-tripping through
/// `serde_json` needs no renaming attributes beyond the ones below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedNode {
    pub terminal: bool,
    #[serde(rename = "docRefs")]
    pub doc_refs: Vec<DocId>,
    pub weight: f32,
    #[serde(rename = "prefixCount")]
    pub prefix_count: u32,
    pub depth: u32,
    pub children: BTreeMap<char, SerializedNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub name: String,
    pub version: u64,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub key: DocId,
    pub value: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexState {
    pub trie: SerializedNode,
    #[serde(rename = "dataMap")]
    pub data_map: BTreeMap<String, Vec<DocId>>,
}

/// The full snapshot payload (spec §4.4 / §6). `documents` preserves
/// insertion order, matching `IndexManager`'s own ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub documents: Vec<DocumentEntry>,
    #[serde(rename = "indexState")]
    pub index_state: IndexState,
    pub config: SnapshotConfig,
}

impl Snapshot {
    /// Parse and validate shape in one step (spec §6: "missing required
    /// fields must fail the import"). `serde_json`'s own missing-field
    /// errors already satisfy this; this wrapper exists so callers get the
    /// crate's `Error` type rather than a bare `serde_json::Error`.
    pub fn from_json(payload: &str) -> Result<Snapshot> {
        serde_json::from_str(payload).map_err(Error::from)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }
}

/// Walk the arena trie into its serializable tree form.
pub fn serialize_trie(trie: &Trie, node_id: NodeId) -> SerializedNode {
    let node = trie.node_ref(node_id);
    let children = trie
        .child_edges(node_id)
        .map(|(ch, child)| (ch, serialize_trie(trie, child)))
        .collect();
    SerializedNode {
        terminal: node.terminal,
        doc_refs: node.doc_refs.iter().cloned().collect(),
        weight: node.weight,
        prefix_count: node.prefix_count,
        depth: node.depth,
        children,
    }
}

/// Rebuild a trie from its serialized form by replaying token insertions.
/// The arena trie has no direct "graft subtree" operation, so reconstruction
/// walks the serialized tree collecting `(token, doc_id)` pairs and inserts
/// each through the normal `Trie::insert` path, then patches in the
/// recorded `weight`/`prefix_count` so re-import reproduces the exported
/// scores exactly rather than the insertion-order-derived ones.
pub fn deserialize_trie(serialized: &SerializedNode) -> Trie {
    let mut trie = Trie::new();
    collect_and_insert(serialized, String::new(), &mut trie);
    trie
}

fn collect_and_insert(node: &SerializedNode, prefix: String, trie: &mut Trie) {
    if node.terminal {
        for doc_id in &node.doc_refs {
            trie.insert(&prefix, doc_id.clone(), 0);
        }
        trie.set_node_stats(&prefix, node.weight, node.prefix_count, node.depth);
    }
    for (ch, child) in &node.children {
        let mut next = prefix.clone();
        next.push(*ch);
        collect_and_insert(child, next, trie);
    }
}
