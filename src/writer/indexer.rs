use std::sync::{Arc, LazyLock};
use chrono::Utc;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};
use crate::analysis::analyzer::AnalyzerRegistry;
use crate::core::error::{Error, Result};
use crate::core::types::{Document, FieldValue};
use crate::schema::schema::FieldConfiguration;
use crate::writer::record::BibliographicRecord;

/// Record attributes copied into a document, in extraction order
pub const RECORD_FIELDS: &[&str] = &[
    "title", "author", "year", "journal", "volume", "number", "pages", "month", "note",
    "publisher", "series", "address", "edition", "booktitle", "chapter", "editor",
    "howpublished", "institution", "organization", "school", "abstract", "keywords",
    "doi", "isbn", "issn", "url", "eprint", "archiveprefix", "primaryclass",
];

/// Fields concatenated into `search_text` and `content`
pub const SEARCH_TEXT_FIELDS: &[&str] = &[
    "title", "author", "abstract", "keywords", "journal", "booktitle", "note",
];

const INTEGER_FIELDS: &[&str] = &["volume", "number", "chapter"];

static KEYWORD_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[,;]+").expect("static pattern")
});

/// Turns bibliographic records into flat searchable documents
#[derive(Clone)]
pub struct RecordIndexer {
    schema: Arc<FieldConfiguration>,
    analyzers: Arc<AnalyzerRegistry>,
}

impl RecordIndexer {
    pub fn new(schema: FieldConfiguration) -> Self {
        RecordIndexer {
            schema: Arc::new(schema),
            analyzers: Arc::new(AnalyzerRegistry::new()),
        }
    }

    pub fn with_analyzers(schema: Arc<FieldConfiguration>, analyzers: Arc<AnalyzerRegistry>) -> Self {
        RecordIndexer { schema, analyzers }
    }

    pub fn schema(&self) -> &FieldConfiguration {
        &self.schema
    }

    pub fn index_record<R: BibliographicRecord + ?Sized>(&self, record: &R) -> Result<Document> {
        let key = record.key().trim();
        if key.is_empty() {
            return Err(Error::index("Record has an empty key"));
        }

        let mut doc = Document::new();
        doc.add_field("key", key);
        doc.add_field("entry_type", record.entry_type().to_lowercase());

        let mut search_text_parts = Vec::new();
        for &name in RECORD_FIELDS {
            let Some(value) = record.field(name) else { continue };
            if value.is_empty() || !self.should_index_field(name) {
                continue;
            }

            let value = if name == "year" { coerce_integer(value) } else { value };

            if SEARCH_TEXT_FIELDS.contains(&name) {
                search_text_parts.push(value.to_string());
            }

            if self.schema.should_process(name) {
                let tokens = self.analyze(name, &value.to_string());
                if !tokens.is_empty() {
                    doc.add_field(format!("{}_analyzed", name), tokens.join(" "));
                }
            }

            doc.add_field(name, value);
        }

        if !search_text_parts.is_empty() {
            doc.add_field("search_text", search_text_parts.join(" "));
        }

        self.add_derived_fields(&mut doc);
        add_metadata(&mut doc, record);

        debug!(key, fields = doc.len(), "indexed record");
        Ok(doc)
    }

    /// Index records in parallel, keeping input order and skipping failures
    pub fn index_batch<R: BibliographicRecord>(&self, records: &[R]) -> Vec<Document> {
        let results: Vec<(&str, Result<Document>)> = records
            .par_iter()
            .map(|record| (record.key(), self.index_record(record)))
            .collect();

        results.into_iter()
            .filter_map(|(key, result)| match result {
                Ok(doc) => Some(doc),
                Err(err) => {
                    warn!("{}: {}", key, err.context);
                    None
                }
            })
            .collect()
    }

    /// Human-readable problems with an indexed document; never fails
    pub fn validate_document(&self, doc: &Document) -> Vec<String> {
        let mut errors = Vec::new();

        match doc.get_field("key") {
            None => errors.push("Document missing required 'key' field".to_string()),
            Some(value) if value.is_empty() => errors.push("Document has empty 'key' field".to_string()),
            Some(_) => {}
        }

        if doc.get_field("entry_type").is_none() {
            errors.push("Document missing required 'entry_type' field".to_string());
        }

        if let Some(year) = doc.get_field("year") {
            if !matches!(year, FieldValue::Integer(_)) {
                errors.push("Field 'year' must be integer".to_string());
            }
        }

        for (name, value) in doc.iter() {
            if name.ends_with("_analyzed") && value.is_empty() {
                errors.push(format!("Empty analyzed field: {}", name));
            }
        }

        errors
    }

    pub fn should_index_field(&self, field: &str) -> bool {
        self.schema.get_field(field).is_none_or(|f| f.indexed)
    }

    /// Analyzer used for `field`: schema override, then the field table
    pub fn field_analyzer_name(&self, field: &str) -> &str {
        let name = self.schema.get_analyzer(field)
            .unwrap_or_else(|| self.analyzers.analyzer_name_for_field(field));
        if name == "stemming" && !self.schema.enable_stemming {
            "standard"
        } else {
            name
        }
    }

    fn analyze(&self, field: &str, text: &str) -> Vec<String> {
        match self.analyzers.get(self.field_analyzer_name(field)) {
            Some(analyzer) => analyzer.analyze_terms(text),
            None => self.analyzers.analyze_field(field, text),
        }
    }

    fn add_derived_fields(&self, doc: &mut Document) {
        if let Some(search_text) = doc.text("search_text").map(str::to_string) {
            let analyzed = self.analyze("content", &search_text);
            doc.add_field("content", search_text);
            if !analyzed.is_empty() {
                doc.add_field("content_analyzed", analyzed.join(" "));
            }
        }

        for (source, target) in [("author", "author_list"), ("editor", "editor_list")] {
            if let Some(names) = doc.get_field(source).map(|v| parse_names(&v.to_string())) {
                doc.add_field(target, names);
            }
        }

        for &field in INTEGER_FIELDS {
            if let Some(value) = doc.get_field(field) {
                let leading = value.to_string();
                let leading = leading.split('-').next().unwrap_or_default().trim();
                if let Ok(n) = leading.parse::<i64>() {
                    doc.add_field(field, n);
                }
            }
        }

        if let Some(keywords) = doc.get_field("keywords").map(keyword_list) {
            if !keywords.is_empty() {
                doc.add_field("keywords_list", keywords);
            }
        }
    }
}

fn coerce_integer(value: FieldValue) -> FieldValue {
    let parsed = match &value {
        FieldValue::Text(s) => s.trim().parse::<i64>().ok(),
        FieldValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        _ => None,
    };
    parsed.map(FieldValue::Integer).unwrap_or(value)
}

/// Split a name list on `and`, tolerating repeated, leading and trailing separators
pub fn parse_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        if word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        names.push(current.join(" "));
    }

    names
}

fn keyword_list(value: &FieldValue) -> Vec<String> {
    let raw: Vec<String> = match value {
        FieldValue::List(items) => items.clone(),
        other => KEYWORD_SEPARATOR.split(&other.to_string()).map(str::to_string).collect(),
    };
    raw.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn add_metadata<R: BibliographicRecord + ?Sized>(doc: &mut Document, record: &R) {
    let now = Utc::now();
    let added = record.added();
    let modified = record.modified().or(added).unwrap_or(now);

    doc.add_field("indexed_at", now.to_rfc3339());
    doc.add_field("modified", modified.to_rfc3339());
    doc.add_field("added", added.unwrap_or(now).to_rfc3339());

    let text_length: usize = doc.iter()
        .filter(|(name, _)| !name.ends_with("_analyzed"))
        .filter_map(|(_, value)| value.as_text())
        .map(|text| text.chars().count())
        .sum();
    doc.add_field("_text_length", text_length as i64);

    let field_count = doc.iter().filter(|(name, _)| !name.starts_with('_')).count();
    doc.add_field("_field_count", field_count as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::writer::record::Record;

    fn indexer() -> RecordIndexer {
        RecordIndexer::new(FieldConfiguration::new())
    }

    fn sample() -> Record {
        Record::new("smith2024", "Article")
            .with("title", "Learning Graph Representations")
            .with("author", "Jane Smith and  and John Doe and")
            .with("year", "2024")
            .with("volume", "12-13")
            .with("journal", "Nature Machine Intelligence")
            .with("keywords", "graphs; embeddings,, learning")
            .with("doi", "10.1000/xyz")
    }

    #[test]
    fn test_copies_fields_and_builds_search_text() {
        let doc = indexer().index_record(&sample()).unwrap();
        assert_eq!(doc.key(), Some("smith2024"));
        assert_eq!(doc.entry_type(), Some("article"));
        assert_eq!(doc.get_field("year"), Some(&FieldValue::Integer(2024)));
        assert_eq!(
            doc.text("search_text"),
            Some("Learning Graph Representations Jane Smith and  and John Doe and Nature Machine Intelligence graphs; embeddings,, learning")
        );
        assert_eq!(doc.text("content"), doc.text("search_text"));
        assert!(doc.text("content_analyzed").is_some());
    }

    #[test]
    fn test_analyzed_variants() {
        let doc = indexer().index_record(&sample()).unwrap();
        assert_eq!(doc.text("title_analyzed"), Some("learn graph represent"));
        assert_eq!(doc.text("journal_analyzed"), Some("nature machine intelligence"));
        assert!(doc.get_field("doi_analyzed").is_none());
    }

    #[test]
    fn test_derived_lists_and_integers() {
        let doc = indexer().index_record(&sample()).unwrap();
        assert_eq!(
            doc.get_field("author_list"),
            Some(&FieldValue::List(vec!["Jane Smith".into(), "John Doe".into()]))
        );
        assert_eq!(doc.get_field("volume"), Some(&FieldValue::Integer(12)));
        assert_eq!(
            doc.get_field("keywords_list"),
            Some(&FieldValue::List(vec!["graphs".into(), "embeddings".into(), "learning".into()]))
        );
    }

    #[test]
    fn test_dates_default_and_fallback() {
        let added = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let doc = indexer().index_record(&sample().added_at(added)).unwrap();
        assert_eq!(doc.text("added"), Some(added.to_rfc3339().as_str()));
        assert_eq!(doc.text("modified"), Some(added.to_rfc3339().as_str()));
        assert!(doc.text("indexed_at").is_some());
    }

    #[test]
    fn test_metadata_counts() {
        let record = Record::new("k", "misc").with("title", "Abc");
        let doc = indexer().index_record(&record).unwrap();
        let FieldValue::Integer(count) = doc.get_field("_field_count").unwrap().clone() else { panic!() };
        let public = doc.iter().filter(|(n, _)| !n.starts_with('_')).count();
        assert_eq!(count as usize, public);

        let dates: usize = ["added", "modified", "indexed_at"].iter()
            .map(|f| doc.text(f).unwrap().chars().count())
            .sum();
        // key + entry_type + title + search_text + content + dates
        let expected = 1 + 4 + 3 + 3 + 3 + dates;
        assert_eq!(doc.get_field("_text_length"), Some(&FieldValue::Integer(expected as i64)));
    }

    #[test]
    fn test_blank_key_fails() {
        let err = indexer().index_record(&Record::new("  ", "article")).unwrap_err();
        assert_eq!(err.context, "Record has an empty key");
    }

    #[test]
    fn test_index_batch_skips_failures_in_order() {
        let records = vec![
            Record::new("a", "misc").with("title", "First"),
            Record::new("", "misc"),
            Record::new("c", "misc").with("title", "Third"),
        ];
        let docs = indexer().index_batch(&records);
        let keys: Vec<_> = docs.iter().filter_map(|d| d.key()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_validate_document() {
        let idx = indexer();
        let mut doc = Document::new().with_field("key", "").with_field("year", "20x4");
        doc.add_field("title_analyzed", "");
        let errors = idx.validate_document(&doc);
        assert_eq!(errors, vec![
            "Document has empty 'key' field",
            "Document missing required 'entry_type' field",
            "Field 'year' must be integer",
            "Empty analyzed field: title_analyzed",
        ]);
        assert!(idx.validate_document(&idx.index_record(&sample()).unwrap()).is_empty());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names("A. Turing AND  and Alonzo Church and"), vec!["A. Turing", "Alonzo Church"]);
        assert!(parse_names("  ").is_empty());
    }
}
