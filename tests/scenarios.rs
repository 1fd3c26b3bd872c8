//! Black-box end-to-end scenarios run only through the public façade, one
//! per literal scenario spec.md §8 enumerates (S1-S6).

use std::sync::Arc;
use std::time::Duration;

use triedex::core::types::Value;
use triedex::{
    CacheConfig, DocId, Document, EngineConfig, EvictionPolicy, ExternalStore, MemoryStore,
    SearchEngine, SearchOptions,
};

fn doc(id: &str, field: &str, text: &str) -> Document {
    Document::new(DocId::new(id)).with_field(field, Value::Text(text.to_string()))
}

fn config() -> EngineConfig {
    EngineConfig::new(
        "scenarios-idx",
        vec!["title".to_string(), "content".to_string()],
    )
}

async fn seeded_engine() -> SearchEngine {
    let engine = SearchEngine::new(config());
    engine.initialize().await.unwrap();
    engine
        .add_documents(vec![
            doc("a", "title", "Hello world"),
            doc("b", "title", "Hello there"),
            doc("c", "content", "running fast"),
            doc("d", "content", "abc123"),
            doc("e", "content", "xyz"),
        ])
        .await
        .unwrap();
    engine
}

fn opts_with_threshold(threshold: f32) -> SearchOptions {
    SearchOptions {
        threshold,
        ..SearchOptions::default()
    }
}

#[tokio::test]
async fn s1_exact_match_returns_both_tied_in_insertion_order() {
    let engine = seeded_engine().await;
    let results = engine.search("hello", opts_with_threshold(0.0)).await.unwrap();

    let ids: Vec<_> = results.hits.iter().map(|h| h.doc_id.clone()).collect();
    assert_eq!(ids, vec![DocId::new("a"), DocId::new("b")]);
    assert_eq!(results.hits[0].score, results.hits[1].score);
}

#[tokio::test]
async fn s2_fuzzy_finds_typo_while_exact_match_does_not() {
    let engine = seeded_engine().await;

    let fuzzy = engine
        .search(
            "helo",
            SearchOptions {
                fuzzy: true,
                max_distance: 1,
                threshold: 0.0,
                ..SearchOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(fuzzy.hits.len(), 2);

    let exact = engine.search("helo", opts_with_threshold(0.0)).await.unwrap();
    assert!(exact.hits.is_empty());
}

#[tokio::test]
async fn s3_stemmed_query_terms_find_the_stored_inflection() {
    let engine = seeded_engine().await;

    let by_run = engine.search("run", opts_with_threshold(0.0)).await.unwrap();
    assert_eq!(by_run.hits.len(), 1);
    assert_eq!(by_run.hits[0].doc_id, DocId::new("c"));

    let by_runs = engine.search("runs", opts_with_threshold(0.0)).await.unwrap();
    assert_eq!(by_runs.hits.len(), 1);
    assert_eq!(by_runs.hits[0].doc_id, DocId::new("c"));
}

#[tokio::test]
async fn s4_regex_matches_only_the_one_conforming_document() {
    let engine = seeded_engine().await;

    let results = engine
        .search(
            "",
            SearchOptions {
                regex: Some("^a.*3$".to_string()),
                min_score: 0.0,
                ..SearchOptions::default()
            },
        )
        .await
        .unwrap();

    let ids: Vec<_> = results.hits.iter().map(|h| h.doc_id.clone()).collect();
    assert_eq!(ids, vec![DocId::new("d")]);
}

/// S5: export happens implicitly on every mutation (`persist_snapshot`); a
/// second engine sharing the same store stands in for "clear engine" since
/// nothing about its own manager is seeded before `initialize` imports the
/// persisted snapshot.
#[tokio::test]
async fn s5_snapshot_round_trip_reproduces_s1_s2_s3_answers() {
    let store: Arc<dyn ExternalStore> = Arc::new(MemoryStore::new());
    let first = SearchEngine::with_store(config(), Arc::clone(&store));
    first.initialize().await.unwrap();
    first
        .add_documents(vec![
            doc("a", "title", "Hello world"),
            doc("b", "title", "Hello there"),
            doc("c", "content", "running fast"),
        ])
        .await
        .unwrap();

    let restored = SearchEngine::with_store(config(), store);
    restored.initialize().await.unwrap();

    let s1 = restored.search("hello", opts_with_threshold(0.0)).await.unwrap();
    assert_eq!(
        s1.hits.iter().map(|h| h.doc_id.clone()).collect::<Vec<_>>(),
        vec![DocId::new("a"), DocId::new("b")]
    );

    let s2_fuzzy = restored
        .search(
            "helo",
            SearchOptions {
                fuzzy: true,
                max_distance: 1,
                threshold: 0.0,
                ..SearchOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(s2_fuzzy.hits.len(), 2);

    let s3 = restored.search("runs", opts_with_threshold(0.0)).await.unwrap();
    assert_eq!(s3.hits.len(), 1);
    assert_eq!(s3.hits[0].doc_id, DocId::new("c"));
}

#[tokio::test]
async fn s6_cache_reports_capacity_and_a_single_eviction() {
    let mut cfg = config();
    cfg.cache = CacheConfig {
        capacity: 2,
        ttl: Duration::from_secs(60),
        policy: EvictionPolicy::Lru,
    };
    let engine = SearchEngine::new(cfg);
    engine.initialize().await.unwrap();
    engine
        .add_documents(vec![doc("a", "title", "Hello world")])
        .await
        .unwrap();

    engine.search("one", opts_with_threshold(0.0)).await.unwrap();
    engine.search("two", opts_with_threshold(0.0)).await.unwrap();
    engine.search("three", opts_with_threshold(0.0)).await.unwrap();

    let stats = engine.cache_stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.evictions, 1);
}

#[tokio::test]
async fn quoted_phrase_requires_adjacent_words_in_order() {
    let engine = SearchEngine::new(config());
    engine.initialize().await.unwrap();
    engine
        .add_documents(vec![
            doc("a", "title", "the quick brown fox"),
            doc("b", "title", "brown and quick is the fox"),
        ])
        .await
        .unwrap();

    let results = engine
        .search(r#""quick brown""#, opts_with_threshold(0.0))
        .await
        .unwrap();
    let ids: Vec<_> = results.hits.iter().map(|h| h.doc_id.clone()).collect();
    assert_eq!(ids, vec![DocId::new("a")]);
}
