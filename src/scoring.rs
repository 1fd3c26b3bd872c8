//! Scoring formulas for trie terminal matches (spec §4.1.2). The constants
//! here (the 24h recency half-life, the `depth + 1` position boost) are
//! fixed by the spec so result ordering stays reproducible across runs —
//! they are not tunable knobs.

use crate::trie::TrieNode;

const RECENCY_HALF_LIFE_MS: f64 = 86_400_000.0;

/// `baseScore` from spec §4.1.2, standalone: `(weight · frequency · recency)
/// / (depth + 1)`. Exposed on its own because `RegexWalker` (spec §4.6)
/// multiplies this same quantity by a match-count/length/depth factor
/// instead of the tfidf/position/length-norm factors the standard path uses.
pub fn base_score(node: &TrieNode, now_ms: i64) -> f64 {
    let age_ms = (now_ms - node.last_accessed).max(0) as f64;
    let recency = (-(age_ms) / RECENCY_HALF_LIFE_MS).exp();
    (node.weight as f64 * node.frequency as f64 * recency) / (node.depth as f64 + 1.0)
}

/// `score(n, t)` from spec §4.1.2, for a terminal node `n` matched by token
/// `t` in a corpus of `total_docs` documents.
pub fn score(node: &TrieNode, term: &str, total_docs: usize, now_ms: i64) -> f32 {
    if total_docs == 0 || node.doc_refs.is_empty() || term.is_empty() {
        return 0.0;
    }

    let d = total_docs as f64;
    let freq = node.frequency as f64;
    let doc_refs = node.doc_refs.len() as f64;

    let tfidf = (freq / d) * (d / doc_refs).ln();
    let position_boost = 1.0 / (node.depth as f64 + 1.0);
    let length_norm = 1.0 / (term.chars().count() as f64).sqrt();

    (base_score(node, now_ms) * tfidf * position_boost * length_norm) as f32
}
