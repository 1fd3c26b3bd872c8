use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::analysis;
use crate::core::types::{DocId, Document, Value};
use crate::index::inverted::InvertedMap;
use crate::trie::Trie;

#[derive(Debug, Clone)]
pub struct MatchedDoc {
    pub doc_id: DocId,
    pub score: f32,
    pub matched_terms: BTreeSet<String>,
}

/// Tokenization, field extraction, and multi-term scoring aggregation
/// (spec §4.3). Stateless aside from the indexed-field configuration —
/// trie, inverted map, and document bodies are passed in by the caller
/// (`IndexManager`), matching the teacher's stateless-service pattern
/// (`search::executor::QueryExecutor` takes an `IndexReader` rather than
/// owning data itself).
pub struct IndexMapper {
    pub fields: Vec<String>,
    pub max_word_length: usize,
}

impl IndexMapper {
    pub fn new(fields: Vec<String>, max_word_length: usize) -> Self {
        IndexMapper {
            fields,
            max_word_length,
        }
    }

    /// Concatenate the normalised text of every configured field path
    /// (spec §4.3 step preceding tokenisation).
    pub fn field_text(&self, doc: &Document) -> String {
        self.fields
            .iter()
            .filter_map(|path| doc.get_path(path))
            .map(Value::to_indexable_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn tokenize_document(&self, doc: &Document) -> Vec<String> {
        analysis::tokenize_stemmed(&self.field_text(doc), self.max_word_length)
    }

    /// Feed every token occurrence from `doc`'s indexed fields into the
    /// trie and inverted map in lock-step (spec §3 InvertedMap invariant).
    pub fn index_document(
        &self,
        trie: &mut Trie,
        inverted: &mut InvertedMap,
        doc: &Document,
        now_ms: i64,
    ) {
        for token in self.tokenize_document(doc) {
            trie.insert(&token, doc.id.clone(), now_ms);
            inverted.insert(&token, doc.id.clone());
        }
    }

    fn term_frequency_in_doc(&self, text: &str, term: &str) -> usize {
        analysis::tokenize_stemmed(text, self.max_word_length)
            .iter()
            .filter(|t| t.as_str() == term)
            .count()
    }

    /// `search(query, {fuzzy, maxResults})` from spec §4.3, steps 2-6, plus
    /// quoted-phrase matching (spec §4.5 step 1). `terms` must already be
    /// tokenized/stemmed by the query processor; `phrases` are dequoted,
    /// lower-cased phrase text, matched against the literal field text
    /// rather than the trie (a phrase is never a single trie token).
    /// `doc_text` resolves a document's indexed-field text (for the
    /// term-frequency factor and phrase containment check); `insertion_order`
    /// breaks score ties.
    #[allow(clippy::too_many_arguments)]
    pub fn search(
        &self,
        trie: &Trie,
        inverted: &InvertedMap,
        terms: &[String],
        phrases: &[String],
        fuzzy: bool,
        max_distance: usize,
        max_results: usize,
        total_docs: usize,
        now_ms: i64,
        doc_text: impl Fn(&DocId) -> Option<String>,
        insertion_order: impl Fn(&DocId) -> usize,
    ) -> Vec<MatchedDoc> {
        if terms.is_empty() && phrases.is_empty() {
            return Vec::new();
        }

        let mut accumulator: HashMap<DocId, (f32, BTreeSet<String>)> = HashMap::new();

        for term in terms {
            let hits: Vec<(DocId, f32)> = if fuzzy {
                trie.fuzzy(term, max_distance, total_docs, now_ms)
                    .into_iter()
                    .map(|(doc_id, score, _, _)| (doc_id, score))
                    .collect()
            } else {
                trie.exact(term, total_docs, now_ms)
            };

            for (doc_id, node_score) in hits {
                let text = doc_text(&doc_id).unwrap_or_default();
                let term_freq = self.term_frequency_in_doc(&text, term);
                let inverted_boost = if inverted.contains(term, &doc_id) {
                    1.0
                } else {
                    0.5
                };
                let contribution = node_score * inverted_boost * (1.0 + term_freq as f32);

                let entry = accumulator
                    .entry(doc_id)
                    .or_insert_with(|| (0.0, BTreeSet::new()));
                entry.0 += contribution;
                entry.1.insert(term.clone());
            }
        }

        for phrase in phrases {
            self.search_phrase(trie, phrase, fuzzy, max_distance, total_docs, now_ms, &doc_text, &mut accumulator);
        }

        let term_count = (terms.len() + phrases.len()).max(1) as f32;
        let mut results: Vec<MatchedDoc> = accumulator
            .into_iter()
            .map(|(doc_id, (score, matched_terms))| MatchedDoc {
                doc_id,
                score: score / term_count,
                matched_terms,
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| insertion_order(&a.doc_id).cmp(&insertion_order(&b.doc_id)))
        });
        results.truncate(max_results);
        results
    }

    /// Match one quoted phrase (spec §4.5 step 1) against every word it
    /// contains, intersect the per-word trie hits to find documents holding
    /// all of them, then confirm true adjacency with a literal substring
    /// check against the document's raw indexed text — the trie only proves
    /// "this doc contains this word somewhere", not "these words are next
    /// to each other in this order".
    #[allow(clippy::too_many_arguments)]
    fn search_phrase(
        &self,
        trie: &Trie,
        phrase: &str,
        fuzzy: bool,
        max_distance: usize,
        total_docs: usize,
        now_ms: i64,
        doc_text: &impl Fn(&DocId) -> Option<String>,
        accumulator: &mut HashMap<DocId, (f32, BTreeSet<String>)>,
    ) {
        let words = analysis::tokenize_stemmed(phrase, self.max_word_length);
        if words.is_empty() {
            return;
        }

        let mut per_word_hits: Vec<HashMap<DocId, f32>> = Vec::with_capacity(words.len());
        for word in &words {
            let hits: HashMap<DocId, f32> = if fuzzy {
                trie.fuzzy(word, max_distance, total_docs, now_ms)
                    .into_iter()
                    .map(|(doc_id, score, _, _)| (doc_id, score))
                    .collect()
            } else {
                trie.exact(word, total_docs, now_ms).into_iter().collect()
            };
            per_word_hits.push(hits);
        }

        let Some((first, rest)) = per_word_hits.split_first() else {
            return;
        };
        let mut candidates: Vec<(DocId, f32)> = first
            .iter()
            .map(|(doc_id, score)| (doc_id.clone(), *score))
            .collect();
        for hits in rest {
            candidates.retain_mut(|(doc_id, score)| match hits.get(doc_id) {
                Some(s) => {
                    *score += *s;
                    true
                }
                None => false,
            });
        }

        let lower_phrase = phrase.to_lowercase();
        for (doc_id, score_sum) in candidates {
            let text = doc_text(&doc_id).unwrap_or_default();
            if !text.to_lowercase().contains(&lower_phrase) {
                continue;
            }
            let avg_score = score_sum / words.len() as f32;
            let entry = accumulator
                .entry(doc_id)
                .or_insert_with(|| (0.0, BTreeSet::new()));
            entry.0 += avg_score;
            entry.1.insert(phrase.to_string());
        }
    }
}
