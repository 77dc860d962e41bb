use bibdex::core::engine::{SearchEngine, SearchOptions};
use bibdex::core::types::Document;
use bibdex::search::backend::SearchBackend;
use bibdex::search::executor::MemoryBackend;
use bibdex::search::facets::{DateInterval, RangeBucket};
use bibdex::search::request::{SearchRequest, SortOrder};
use bibdex::writer::record::Record;

fn corpus() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend
        .index(
            "a",
            Document::new()
                .with_field("key", "a")
                .with_field("title", "Machine Learning Fundamentals")
                .with_field("author", "Jane Smith")
                .with_field("year", 2024i64),
        )
        .unwrap();
    backend
        .index(
            "b",
            Document::new()
                .with_field("key", "b")
                .with_field("title", "Deep Learning with Neural Networks")
                .with_field("year", 2023i64),
        )
        .unwrap();
    backend
}

fn keys(backend: &MemoryBackend, query: &str) -> Vec<String> {
    let mut keys: Vec<String> = backend
        .search(&SearchRequest::new(query))
        .unwrap()
        .matches
        .into_iter()
        .map(|m| m.key)
        .collect();
    keys.sort();
    keys
}

#[test]
fn test_terms_match_all_words() {
    let backend = corpus();
    let results = backend.search(&SearchRequest::new("machine learning")).unwrap();
    assert!(results.total >= 1);
    assert_eq!(results.matches[0].key, "a");
}

#[test]
fn test_missing_word_empties_and() {
    let backend = corpus();
    let results = backend.search(&SearchRequest::new("machine AND missingword")).unwrap();
    assert_eq!(results.total, 0);
}

#[test]
fn test_phrase_requires_adjacent_words() {
    let backend = corpus();
    assert_eq!(keys(&backend, "\"deep learning\""), vec!["b"]);
}

#[test]
fn test_range_bounds() {
    let backend = corpus();
    assert_eq!(keys(&backend, "year:[2023 TO 2024]"), vec!["a", "b"]);
    assert!(keys(&backend, "year:{2023 TO 2024}").is_empty());
    assert_eq!(keys(&backend, "year:[2023 TO 2024}"), vec!["b"]);
    assert_eq!(keys(&backend, "year:{2023 TO 2024]"), vec!["a"]);
}

#[test]
fn test_deleted_document_disappears() {
    let backend = corpus();
    assert!(backend.delete("a"));
    assert_eq!(backend.search(&SearchRequest::new("machine")).unwrap().total, 0);
}

#[test]
fn test_title_suggestions() {
    let backend = corpus();
    let suggestions = backend.suggest("mach", "title", 5);
    assert!(suggestions.iter().any(|s| s.to_lowercase().starts_with("mach")));
}

#[test]
fn test_reindex_replaces_document() {
    let backend = corpus();
    backend
        .index(
            "a",
            Document::new()
                .with_field("key", "a")
                .with_field("title", "Graph Theory")
                .with_field("year", 1990i64),
        )
        .unwrap();
    assert!(keys(&backend, "machine").is_empty());
    assert_eq!(keys(&backend, "graph"), vec!["a"]);
    assert_eq!(backend.statistics().documents, 2);
}

fn engine() -> SearchEngine {
    let engine = SearchEngine::new().unwrap();
    let records = vec![
        Record::new("knuth1997", "book")
            .with("title", "The Art of Computer Programming")
            .with("author", "Knuth, Donald E.")
            .with("year", "1997")
            .with("publisher", "Addison-Wesley")
            .with("keywords", "algorithms; programming"),
        Record::new("vaswani2017", "inproceedings")
            .with("title", "Attention Is All You Need")
            .with("author", "Ashish Vaswani and Noam Shazeer")
            .with("year", 2017i64)
            .with("booktitle", "Advances in Neural Information Processing Systems")
            .with("abstract", "We propose a new simple network architecture, the Transformer."),
        Record::new("lecun2015", "article")
            .with("title", "Deep Learning")
            .with("author", "LeCun, Yann and Bengio, Yoshua and Hinton, Geoffrey")
            .with("year", 2015i64)
            .with("journal", "Nature")
            .with("keywords", "neural networks, representation learning"),
        Record::new("", "article").with("title", "Missing key"),
    ];
    assert_eq!(engine.index_records(&records).unwrap(), 3);
    engine
}

#[test]
fn test_engine_skips_bad_records() {
    let engine = engine();
    let stats = engine.statistics();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.pipeline.error_count, 1);
}

#[test]
fn test_engine_author_and_keyword_search() {
    let engine = engine();
    let results = engine.search("author:hinton", SearchOptions::default());
    assert_eq!(results.keys(), vec!["lecun2015"]);

    let results = engine.search("keywords_list:algorithms", SearchOptions::default());
    assert_eq!(results.keys(), vec!["knuth1997"]);
}

#[test]
fn test_engine_sort_and_paginate() {
    let engine = engine();
    let options = SearchOptions {
        sort: SortOrder::DateDesc,
        limit: Some(2),
        ..Default::default()
    };
    let first = engine.search("year:[* TO *]", options.clone());
    assert_eq!(first.total, 3);
    assert_eq!(first.keys(), vec!["vaswani2017", "lecun2015"]);
    assert!(first.has_more());

    let second = engine.search("year:[* TO *]", SearchOptions { offset: 2, ..options });
    assert_eq!(second.keys(), vec!["knuth1997"]);
}

#[test]
fn test_engine_facets() {
    let engine = engine();
    let results = engine.search(
        "year:[2000 TO 2020]",
        SearchOptions { facets: Some(vec!["entry_type".to_string()]), ..Default::default() },
    );
    let entry_types = &results.facets.unwrap()["entry_type"];
    assert_eq!(entry_types.len(), 2);
    assert!(entry_types.iter().all(|f| f.count == 1));
}

#[test]
fn test_engine_fuzzy_finds_misspelling() {
    let engine = engine();
    let results = engine.search("atention~1", SearchOptions::default());
    assert_eq!(results.keys(), vec!["vaswani2017"]);
}

#[test]
fn test_engine_spelling_suggestion() {
    let engine = engine();
    let results = engine.search("lerning", SearchOptions::default());
    assert_eq!(results.total, 0);
    assert!(results.suggestions.iter().any(|s| s.suggestion.contains("learning")));
}

#[test]
fn test_engine_field_scope_covers_every_word() {
    let engine = engine();
    engine
        .index_record(
            &Record::new("x", "misc")
                .with("title", "Deep Networks")
                .with("note", "learning"),
        )
        .unwrap();

    let results = engine.search("title:deep learning", SearchOptions::default());
    assert_eq!(results.keys(), vec!["lecun2015"]);

    let results = engine.search("title:deep AND learning", SearchOptions::default());
    let mut keys = results.keys();
    keys.sort();
    assert_eq!(keys, vec!["lecun2015", "x"]);
}

#[test]
fn test_engine_year_buckets() {
    let engine = engine();
    let options = SearchOptions {
        facets: Some(Vec::new()),
        range_facets: [(
            "year".to_string(),
            vec![
                RangeBucket::new(None, Some(2000.0)).labelled("classic"),
                RangeBucket::new(Some(2000.0), None).labelled("modern"),
            ],
        )]
        .into_iter()
        .collect(),
        date_histograms: [("added".to_string(), DateInterval::Year)].into_iter().collect(),
        ..Default::default()
    };
    let results = engine.search("year:[* TO *]", options);
    let facets = results.facets.unwrap();

    let years: Vec<(&str, usize)> = facets["year"].iter().map(|f| (f.value.as_str(), f.count)).collect();
    assert_eq!(years, vec![("classic", 1), ("modern", 2)]);

    let added = &facets["added"];
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].count, 3);
}
