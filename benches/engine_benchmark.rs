use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use triedex::core::types::{DocId, Document, Value};
use triedex::{EngineConfig, SearchEngine, SearchOptions};

fn test_document(id: u64, word_count: usize) -> Document {
    let mut rng = rand::thread_rng();
    let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];
    let content: String = (0..word_count)
        .map(|_| words[rng.gen_range(0..words.len())])
        .collect::<Vec<_>>()
        .join(" ");

    Document::new(DocId::new(format!("doc-{id}")))
        .with_field("title", Value::Text(format!("Document {id}")))
        .with_field("content", Value::Text(content))
}

fn engine() -> SearchEngine {
    let config = EngineConfig::new(
        "bench-idx",
        vec!["title".to_string(), "content".to_string()],
    );
    SearchEngine::new(config)
}

fn bench_single_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = engine();
    rt.block_on(engine.initialize()).unwrap();

    c.bench_function("single_document_insert", |b| {
        let mut id = 0u64;
        b.iter(|| {
            let doc = test_document(id, 100);
            rt.block_on(engine.add_documents(vec![doc])).unwrap();
            id += 1;
        });
    });
}

fn bench_batch_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("batch_insert");

    for batch_size in [10, 50, 100, 500].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let engine = engine();
                rt.block_on(engine.initialize()).unwrap();
                let mut id = 0u64;

                b.iter(|| {
                    let docs: Vec<Document> = (0..batch_size)
                        .map(|_| {
                            let doc = test_document(id, 100);
                            id += 1;
                            doc
                        })
                        .collect();
                    rt.block_on(engine.add_documents(docs)).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = engine();
    rt.block_on(engine.initialize()).unwrap();

    let docs: Vec<Document> = (0..1000).map(|i| test_document(i, 100)).collect();
    rt.block_on(engine.add_documents(docs)).unwrap();

    let mut group = c.benchmark_group("search");

    group.bench_function("exact_term_search", |b| {
        b.iter(|| {
            let opts = SearchOptions {
                threshold: 0.0,
                ..SearchOptions::default()
            };
            let _ = rt.block_on(engine.search(black_box("fox"), opts));
        });
    });

    group.bench_function("fuzzy_search_distance_1", |b| {
        b.iter(|| {
            let opts = SearchOptions {
                fuzzy: true,
                max_distance: 1,
                threshold: 0.0,
                ..SearchOptions::default()
            };
            let _ = rt.block_on(engine.search(black_box("quik"), opts));
        });
    });

    group.bench_function("regex_search", |b| {
        b.iter(|| {
            let opts = SearchOptions {
                regex: Some("^qui.*$".to_string()),
                min_score: 0.0,
                ..SearchOptions::default()
            };
            let _ = rt.block_on(engine.search(black_box(""), opts));
        });
    });

    group.finish();
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.sample_size(10);

    group.bench_function("index_throughput", |b| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        b.iter_custom(|iters| {
            let engine = engine();
            rt.block_on(engine.initialize()).unwrap();
            let mut id = 0u64;

            let start = std::time::Instant::now();
            for _ in 0..iters {
                let docs: Vec<Document> = (0..100)
                    .map(|_| {
                        let doc = test_document(id, 50);
                        id += 1;
                        doc
                    })
                    .collect();
                rt.block_on(engine.add_documents(docs)).unwrap();
            }
            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_insert,
    bench_batch_insert,
    bench_search,
    bench_throughput
);
criterion_main!(benches);
