//! Search-result container returned by `SearchEngine::search` (spec §4.8,
//! §6). Grounded on the teacher's `search::results::SearchResults` /
//! `ScoredDocument` shape, trimmed to what spec.md's contract actually
//! carries (no `ScoreExplanation`/`TopKCollector` — pagination here is a
//! plain slice, not a streaming top-k collector, because the façade already
//! holds every candidate in memory before paginating).

use crate::core::types::{DocId, Document};

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub doc_id: DocId,
    /// Normalised into `[0, 1]` (spec's "Normalised score" glossary entry)
    /// before `threshold`/`minScore` filtering.
    pub score: f32,
    pub document: Document,
    /// Populated only when `SearchOptions::include_matches` is set (spec §6).
    pub matched_terms: Vec<String>,
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Count of candidates that passed the threshold, before pagination —
    /// what `page`/`pageSize` paginate over (spec §8 property 9).
    pub total_hits: usize,
    pub page: usize,
    pub page_size: usize,
    pub took_ms: u64,
}

impl SearchResults {
    pub fn empty(page: usize, page_size: usize, took_ms: u64) -> Self {
        SearchResults {
            hits: Vec::new(),
            total_hits: 0,
            page,
            page_size,
            took_ms,
        }
    }
}

/// Divide every score by the maximum observed score so the set maps into
/// `[0, 1]` (spec glossary "Normalised score"). A candidate set with a zero
/// maximum (e.g. every score already zero) is left as-is.
pub fn normalize_scores(scores: &mut [f32]) {
    let max = scores.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for s in scores.iter_mut() {
            *s /= max;
        }
    }
}

/// Slice `items` (already sorted by descending score) to the requested page
/// (spec §6 `page`/`pageSize`, 1-indexed).
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    items.into_iter().skip(start).take(page_size).collect()
}
