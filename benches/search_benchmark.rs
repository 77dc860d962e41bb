use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bibdex::core::engine::{SearchEngine, SearchOptions};
use bibdex::query::parser::QueryParser;
use bibdex::writer::record::Record;
use rand::Rng;

const WORDS: &[&str] = &[
    "learning", "neural", "networks", "graph", "theory", "quantum", "algorithms", "deep",
    "machine", "retrieval", "language", "models", "optimization", "distributed", "systems",
];

/// Helper to create a random bibliographic record
fn create_test_record(id: usize) -> Record {
    let mut rng = rand::thread_rng();
    let mut words = |n: usize| -> String {
        (0..n)
            .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
            .collect::<Vec<_>>()
            .join(" ")
    };

    let title = words(6);
    let abstract_text = words(60);
    let keywords = words(3).replace(' ', ", ");

    Record::new(format!("rec{}", id), if id % 3 == 0 { "book" } else { "article" })
        .with("title", title)
        .with("abstract", abstract_text)
        .with("keywords", keywords)
        .with("author", format!("Author{}, Jane", id % 50))
        .with("year", 1990 + (id % 35) as i64)
}

fn populated_engine(size: usize) -> SearchEngine {
    let engine = SearchEngine::new().unwrap();
    let records: Vec<Record> = (0..size).map(create_test_record).collect();
    engine.index_records(&records).unwrap();
    engine
}

/// Benchmark batch indexing
fn bench_index_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_records");
    group.sample_size(10);

    for size in [100, 1000].iter() {
        let records: Vec<Record> = (0..*size).map(create_test_record).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let engine = SearchEngine::new().unwrap();
                black_box(engine.index_records(records).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark query parsing
fn bench_parse(c: &mut Criterion) {
    let parser = QueryParser::new();
    let queries = [
        "machine learning",
        "title:\"deep learning\"~2 AND year:[2015 TO 2024]",
        "(neural OR graph) NOT quantum^2",
        "algoritms~1 AND retriev*",
    ];

    c.bench_function("parse_queries", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(parser.parse(q));
            }
        });
    });
}

/// Benchmark search by query kind
fn bench_search(c: &mut Criterion) {
    let engine = populated_engine(2000);
    let mut group = c.benchmark_group("search");

    for (name, query) in [
        ("term", "learning"),
        ("and", "neural AND networks"),
        ("phrase", "\"graph theory\""),
        ("range", "year:[2000 TO 2010]"),
        ("fuzzy", "algoritms~1"),
        ("wildcard", "optim*"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(engine.search(query, SearchOptions::default())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_index_records, bench_parse, bench_search);
criterion_main!(benches);
