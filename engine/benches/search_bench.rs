use criterion::{criterion_group, criterion_main, Criterion};
use engine::{process_queries, DocumentStatus, SearchEngine};

/// Deterministic synthetic corpus: every document draws a handful of words
/// from a fixed vocabulary, so plus words hit many documents.
fn build_corpus(documents: usize) -> SearchEngine {
    let vocabulary = [
        "cat", "dog", "fox", "bear", "grey", "brown", "quick", "lazy", "night", "winter", "river",
        "train", "collar", "tail", "eyes",
    ];
    let mut engine = SearchEngine::from_text("a the of and").unwrap();
    for id in 0..documents {
        let text: Vec<&str> = (0..12)
            .map(|word| vocabulary[(id * 7 + word * 3) % vocabulary.len()])
            .collect();
        engine
            .add_document(
                id as i32,
                &text.join(" "),
                DocumentStatus::Actual,
                &[(id % 11) as i32 - 5],
            )
            .unwrap();
    }
    engine
}

fn bench_find_top_documents(c: &mut Criterion) {
    let engine = build_corpus(10_000);
    let query = "quick grey fox -winter";

    c.bench_function("find_top_documents_sequential", |b| {
        b.iter(|| engine.find_top_documents(query).unwrap())
    });
    c.bench_function("find_top_documents_parallel", |b| {
        b.iter(|| engine.find_top_documents_par(query).unwrap())
    });
}

fn bench_process_queries(c: &mut Criterion) {
    let engine = build_corpus(2_000);
    let queries: Vec<String> = [
        "quick grey fox",
        "cat collar",
        "night train -bear",
        "lazy dog tail",
        "river eyes winter",
    ]
    .iter()
    .cycle()
    .take(50)
    .map(|query| query.to_string())
    .collect();

    c.bench_function("process_queries_50", |b| {
        b.iter(|| process_queries(&engine, &queries).unwrap())
    });
}

criterion_group!(benches, bench_find_top_documents, bench_process_queries);
criterion_main!(benches);
