use std::collections::BTreeMap;

use crate::core::types::DocId;
use crate::scoring;
use crate::trie::{NodeId, Trie};

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (la, lb) = (a.len(), b.len());

    if la == 0 {
        return lb;
    }
    if lb == 0 {
        return la;
    }

    let mut prev: Vec<usize> = (0..=lb).collect();
    let mut curr = vec![0usize; lb + 1];

    for i in 1..=la {
        curr[0] = i;
        for j in 1..=lb {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[lb]
}

/// One raw reachability record before the tie-break collapse (spec §4.1.1).
struct Candidate {
    doc_id: DocId,
    distance: usize,
    term: String,
    node_score: f32,
}

impl Trie {
    /// Bounded Levenshtein walk from the root (spec §4.1.1). `max_distance`
    /// is the edit budget; walks whose running budget drops below zero are
    /// abandoned. Tie-break: smaller distance wins; on equal distance, the
    /// candidate reached through the higher-scoring node wins.
    pub fn fuzzy(
        &self,
        token: &str,
        max_distance: usize,
        total_docs: usize,
        now_ms: i64,
    ) -> Vec<(DocId, f32, String, usize)> {
        let token = token.to_lowercase();
        let w: Vec<char> = token.chars().collect();
        let mut candidates = Vec::new();
        self.walk_fuzzy(
            self.root(),
            String::new(),
            0,
            max_distance as i32,
            &token,
            &w,
            max_distance,
            total_docs,
            now_ms,
            &mut candidates,
        );

        let mut best: BTreeMap<DocId, Candidate> = BTreeMap::new();
        for cand in candidates {
            match best.get(&cand.doc_id) {
                None => {
                    best.insert(cand.doc_id.clone(), cand);
                }
                Some(existing) => {
                    let replace = cand.distance < existing.distance
                        || (cand.distance == existing.distance
                            && cand.node_score > existing.node_score);
                    if replace {
                        best.insert(cand.doc_id.clone(), cand);
                    }
                }
            }
        }

        best.into_values()
            .map(|c| {
                let score = c.node_score * (-(c.distance as f32)).exp();
                (c.doc_id, score, c.term, c.distance)
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_fuzzy(
        &self,
        node_id: NodeId,
        cur: String,
        d: usize,
        budget: i32,
        target: &str,
        w: &[char],
        max_distance: usize,
        total_docs: usize,
        now_ms: i64,
        out: &mut Vec<Candidate>,
    ) {
        if budget < 0 {
            return;
        }

        let node = self.node_ref(node_id);
        if node.terminal {
            let dist = levenshtein(target, &cur);
            if dist <= max_distance {
                let node_score = scoring::score(node, &cur, total_docs, now_ms);
                for doc_id in &node.doc_refs {
                    out.push(Candidate {
                        doc_id: doc_id.clone(),
                        distance: dist,
                        term: cur.clone(),
                        node_score,
                    });
                }
            }
        }

        let edges: Vec<(char, NodeId)> = self.child_edges(node_id).collect();
        for (ch, child) in &edges {
            let mut next_cur = cur.clone();
            next_cur.push(*ch);

            // Substitute: consume one character of `w` per edge taken.
            let sub_cost = if d < w.len() && w[d] == *ch { 0 } else { 1 };
            self.walk_fuzzy(
                *child,
                next_cur.clone(),
                d + 1,
                budget - sub_cost,
                target,
                w,
                max_distance,
                total_docs,
                now_ms,
                out,
            );

            // Insert: the trie has a character `w` does not, at this depth.
            self.walk_fuzzy(
                *child,
                next_cur,
                d,
                budget - 1,
                target,
                w,
                max_distance,
                total_docs,
                now_ms,
                out,
            );
        }

        // Delete: skip a character of `w` without consuming a trie edge.
        if d < w.len() {
            self.walk_fuzzy(
                node_id,
                cur,
                d + 1,
                budget - 1,
                target,
                w,
                max_distance,
                total_docs,
                now_ms,
                out,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;

    #[test]
    fn fuzzy_finds_single_edit_typo() {
        let mut trie = Trie::new();
        trie.insert("hello", DocId::new("a"), 0);
        let hits = trie.fuzzy("helo", 1, 1, 0);
        assert!(hits.iter().any(|(d, _, _, _)| *d == DocId::new("a")));
    }

    #[test]
    fn fuzzy_respects_zero_budget_as_exact() {
        let mut trie = Trie::new();
        trie.insert("hello", DocId::new("a"), 0);
        assert!(trie.fuzzy("helo", 0, 1, 0).is_empty());
        assert!(!trie.fuzzy("hello", 0, 1, 0).is_empty());
    }

    #[test]
    fn fuzzy_monotone_in_budget() {
        let mut trie = Trie::new();
        trie.insert("kitten", DocId::new("a"), 0);
        let small: std::collections::BTreeSet<_> = trie
            .fuzzy("sitting", 2, 1, 0)
            .into_iter()
            .map(|(d, _, _, _)| d)
            .collect();
        let big: std::collections::BTreeSet<_> = trie
            .fuzzy("sitting", 3, 1, 0)
            .into_iter()
            .map(|(d, _, _, _)| d)
            .collect();
        assert!(small.is_subset(&big));
    }
}
