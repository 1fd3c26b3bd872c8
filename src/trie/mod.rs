mod fuzzy;

use std::collections::{BTreeSet, HashMap};

use crate::core::types::DocId;
use crate::scoring;

/// Arena index into `Trie::nodes` (Design Notes §9: back the pointer-heavy
/// trie by an arena of integer handles instead of boxed child references,
/// so removal does not recurse through owned pointers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

const ROOT: NodeId = NodeId(0);

/// A single trie node (spec §3 "TrieNode"). `children` is keyed by
/// character rather than byte, matching the spec's char-level descent.
#[derive(Debug, Clone)]
pub struct TrieNode {
    pub children: HashMap<char, NodeId>,
    pub terminal: bool,
    pub doc_refs: BTreeSet<DocId>,
    pub weight: f32,
    pub frequency: u32,
    pub last_accessed: i64,
    pub prefix_count: u32,
    pub depth: u32,
}

impl TrieNode {
    fn new(depth: u32) -> Self {
        TrieNode {
            children: HashMap::new(),
            terminal: false,
            doc_refs: BTreeSet::new(),
            weight: 0.0,
            frequency: 0,
            last_accessed: 0,
            prefix_count: 0,
            depth,
        }
    }

    /// The deletion predicate from spec §3: a node with this shape must not
    /// exist after a mutation completes.
    fn should_prune(&self) -> bool {
        !self.terminal && self.doc_refs.is_empty() && self.children.is_empty()
    }
}

/// Weighted character trie mapping lower-cased tokens to document
/// references, plus the frequency/recency/depth signals scoring consumes
/// (spec §4.1).
pub struct Trie {
    nodes: Vec<TrieNode>,
}

impl Trie {
    pub fn new() -> Self {
        Trie {
            nodes: vec![TrieNode::new(0)],
        }
    }

    fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        &mut self.nodes[id.0 as usize]
    }

    fn child(&self, id: NodeId, ch: char) -> Option<NodeId> {
        self.node(id).children.get(&ch).copied()
    }

    fn get_or_create_child(&mut self, id: NodeId, ch: char) -> NodeId {
        if let Some(existing) = self.child(id, ch) {
            return existing;
        }
        let depth = self.node(id).depth + 1;
        let new_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TrieNode::new(depth));
        self.node_mut(id).children.insert(ch, new_id);
        new_id
    }

    /// Follow `token` from the root, returning the node reached if every
    /// character has a child edge.
    fn walk(&self, token: &str) -> Option<NodeId> {
        let mut current = ROOT;
        for ch in token.chars() {
            current = self.child(current, ch)?;
        }
        Some(current)
    }

    /// Insert one occurrence of `token` for `doc_id` (spec §4.1 `insert`).
    /// Called once per token occurrence, not deduplicated per document —
    /// `frequency` is a raw occurrence count the TF-IDF-like formula in
    /// §4.1.2 divides by the corpus size.
    pub fn insert(&mut self, token: &str, doc_id: DocId, now_ms: i64) {
        let mut current = ROOT;
        for ch in token.chars() {
            current = self.get_or_create_child(current, ch);
            let node = self.node_mut(current);
            node.prefix_count += 1;
        }
        let node = self.node_mut(current);
        node.terminal = true;
        node.doc_refs.insert(doc_id);
        node.weight += 1.0;
        node.frequency += 1;
        node.last_accessed = now_ms;
    }

    /// Remove every reference to `doc_id` from the trie and prune any node
    /// left empty (spec §4.1 `removeDoc`). Implemented as an explicit
    /// post-order stack walk rather than native recursion (Design Notes
    /// §9), bounded by the trie's depth rather than the call stack.
    pub fn remove_doc(&mut self, doc_id: &DocId) {
        // Pass 1: pre-order, collect every node id plus its parent+edge so
        // pass 2 can process children before parents (post-order).
        let mut order = Vec::new();
        let mut stack = vec![(ROOT, None::<(NodeId, char)>)];
        while let Some((id, parent_edge)) = stack.pop() {
            order.push((id, parent_edge));
            let edges: Vec<(char, NodeId)> = self
                .node(id)
                .children
                .iter()
                .map(|(&c, &n)| (c, n))
                .collect();
            for (c, child_id) in edges {
                stack.push((child_id, Some((id, c))));
            }
        }

        for (id, parent_edge) in order.into_iter().rev() {
            let node = self.node_mut(id);
            if node.doc_refs.remove(doc_id) {
                node.weight = (node.weight - 1.0).max(0.0);
                node.prefix_count = node.prefix_count.saturating_sub(1);
                if node.doc_refs.is_empty() {
                    node.terminal = false;
                }
            }
            if id != ROOT && self.node(id).should_prune() {
                if let Some((parent, edge)) = parent_edge {
                    self.node_mut(parent).children.remove(&edge);
                }
            }
        }

        self.compact();
    }

    /// Rebuild `nodes` from only what's still reachable from `ROOT`,
    /// reassigning sequential `NodeId`s in BFS discovery order (root always
    /// lands back at index 0). Pruned subtrees were already unlinked from
    /// their parent's `children` above, so this is what actually reclaims
    /// the arena slots spec §3's deletion predicate requires to be gone —
    /// unlinking alone leaves them dangling in `nodes` forever, since the
    /// arena only ever grows via `push`.
    fn compact(&mut self) {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut order: Vec<NodeId> = vec![ROOT];
        remap.insert(ROOT.0, 0);

        let mut cursor = 0;
        while cursor < order.len() {
            let current = order[cursor];
            cursor += 1;
            let edges: Vec<(char, NodeId)> = self
                .node(current)
                .children
                .iter()
                .map(|(&c, &n)| (c, n))
                .collect();
            for (_, child) in edges {
                if let std::collections::hash_map::Entry::Vacant(e) = remap.entry(child.0) {
                    e.insert(order.len() as u32);
                    order.push(child);
                }
            }
        }

        let new_nodes: Vec<TrieNode> = order
            .into_iter()
            .map(|old_id| {
                let mut node = self.node(old_id).clone();
                node.children = node
                    .children
                    .iter()
                    .map(|(&ch, &child)| (ch, NodeId(remap[&child.0])))
                    .collect();
                node
            })
            .collect();
        self.nodes = new_nodes;
    }

    /// Exact membership (spec §4.1 `exact`).
    pub fn exact(&self, token: &str, total_docs: usize, now_ms: i64) -> Vec<(DocId, f32)> {
        let token = token.to_lowercase();
        let Some(id) = self.walk(&token) else {
            return Vec::new();
        };
        let node = self.node(id);
        if !node.terminal {
            return Vec::new();
        }
        let score = scoring::score(node, &token, total_docs, now_ms);
        node.doc_refs.iter().cloned().map(|d| (d, score)).collect()
    }

    /// Prefix search: walk to the prefix node, then DFS every terminal in
    /// its subtree (spec §4.1 `prefix`). Guarantees `prefix(t) ⊇ exact(t)`
    /// because the prefix node itself is visited first.
    pub fn prefix(
        &self,
        prefix: &str,
        total_docs: usize,
        now_ms: i64,
    ) -> Vec<(DocId, f32, String)> {
        let prefix = prefix.to_lowercase();
        let Some(start) = self.walk(&prefix) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut stack = vec![(start, prefix.clone())];
        while let Some((id, text)) = stack.pop() {
            let node = self.node(id);
            if node.terminal {
                let score = scoring::score(node, &text, total_docs, now_ms);
                for doc in &node.doc_refs {
                    results.push((doc.clone(), score, text.clone()));
                }
            }
            for (&ch, &child) in &node.children {
                let mut next = text.clone();
                next.push(ch);
                stack.push((child, next));
            }
        }
        results
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> &TrieNode {
        self.node(id)
    }

    /// Overwrite a terminal's `weight`/`prefix_count` after replaying
    /// inserts from a snapshot, so re-import reproduces the exported
    /// scores exactly rather than the insertion-order-derived ones.
    pub(crate) fn set_node_stats(&mut self, token: &str, weight: f32, prefix_count: u32, depth: u32) {
        if let Some(id) = self.walk(token) {
            let node = self.node_mut(id);
            node.weight = weight;
            node.prefix_count = prefix_count;
            node.depth = depth;
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        ROOT
    }

    pub(crate) fn child_edges(&self, id: NodeId) -> impl Iterator<Item = (char, NodeId)> + '_ {
        self.node(id).children.iter().map(|(&c, &n)| (c, n))
    }
}

impl Default for Trie {
    fn default() -> Self {
        Trie::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> i64 {
        0
    }

    #[test]
    fn insert_then_exact_roundtrips() {
        let mut trie = Trie::new();
        trie.insert("hello", DocId::new("a"), now());
        let hits = trie.exact("hello", 1, now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId::new("a"));
    }

    #[test]
    fn exact_misses_on_unknown_token() {
        let mut trie = Trie::new();
        trie.insert("hello", DocId::new("a"), now());
        assert!(trie.exact("goodbye", 1, now()).is_empty());
    }

    #[test]
    fn prefix_superset_of_exact() {
        let mut trie = Trie::new();
        trie.insert("cat", DocId::new("a"), now());
        trie.insert("catalog", DocId::new("b"), now());

        let exact: BTreeSet<_> = trie
            .exact("cat", 2, now())
            .into_iter()
            .map(|(d, _)| d)
            .collect();
        let prefix: BTreeSet<_> = trie
            .prefix("cat", 2, now())
            .into_iter()
            .map(|(d, _, _)| d)
            .collect();
        assert!(exact.is_subset(&prefix));
        assert!(prefix.contains(&DocId::new("b")));
    }

    #[test]
    fn remove_doc_prunes_orphaned_nodes() {
        let mut trie = Trie::new();
        trie.insert("cat", DocId::new("a"), now());
        trie.remove_doc(&DocId::new("a"));
        assert!(trie.exact("cat", 0, now()).is_empty());
        // every non-root node should have been pruned
        assert_eq!(trie.nodes.len(), 1);
    }

    #[test]
    fn remove_doc_keeps_shared_prefix_alive() {
        let mut trie = Trie::new();
        trie.insert("cat", DocId::new("a"), now());
        trie.insert("car", DocId::new("b"), now());
        trie.remove_doc(&DocId::new("a"));
        assert!(trie.exact("cat", 1, now()).is_empty());
        assert_eq!(trie.exact("car", 1, now()).len(), 1);
    }

    #[test]
    fn no_node_violates_the_prune_predicate() {
        let mut trie = Trie::new();
        trie.insert("cat", DocId::new("a"), now());
        trie.insert("cats", DocId::new("b"), now());
        trie.remove_doc(&DocId::new("a"));
        for node in &trie.nodes {
            assert!(!node.should_prune());
        }
    }
}
