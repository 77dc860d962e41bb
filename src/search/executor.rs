use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use chrono::{DateTime, NaiveDate};
use parking_lot::RwLock;
use regex::RegexBuilder;
use roaring::RoaringBitmap;
use tracing::{debug, warn};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document, FieldValue};
use crate::index::inverted::{index_tokens, is_system_field, IndexStatistics, InvertedIndex};
use crate::query::ast::{
    BooleanOperator, BooleanQuery, FuzzyQuery, PhraseQuery, QueryNode, RangeQuery, RangeValue,
    TermQuery, WildcardQuery,
};
use crate::query::parser::QueryParser;
use crate::query::validator;
use crate::scoring::scorer::{
    clamp_score, range_score, term_frequency, FieldBoosts, FieldLengthScorer, FieldStats, Scorer,
};
use crate::search::backend::SearchBackend;
use crate::search::facets::{
    compute_date_histogram, compute_facets, compute_range_facet, DEFAULT_FACET_SIZE,
};
use crate::search::fuzzy::FuzzyAutomaton;
use crate::search::highlight::Highlighter;
use crate::search::request::{QueryInput, SearchRequest, SortOrder};
use crate::search::results::{Match, ResultSet, ScoredDocument, TopKCollector};

/// Document id -> accumulated score, ordered for deterministic merging
type Hits = BTreeMap<u32, f64>;

const MISSING_YEAR: i64 = 9999;

#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub max_limit: usize,
    pub enable_fuzzy: bool, // When off, fuzzy clauses match their term exactly
    pub field_boosts: FieldBoosts,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions {
            max_limit: 1000,
            enable_fuzzy: true,
            field_boosts: FieldBoosts::default(),
        }
    }
}

impl BackendOptions {
    pub fn from_config(config: &Config, enable_fuzzy: bool) -> Self {
        BackendOptions {
            max_limit: config.max_limit.max(1),
            enable_fuzzy,
            field_boosts: FieldBoosts::from_config(config),
        }
    }
}

/// In-memory backend. One writer lock guards the whole index; searches
/// hold the read half and see a stable state.
pub struct MemoryBackend {
    index: RwLock<InvertedIndex>,
    parser: QueryParser,
    scorer: Box<dyn Scorer>,
    highlighter: Highlighter,
    options: BackendOptions,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_options(BackendOptions::default())
    }

    pub fn with_options(options: BackendOptions) -> Self {
        MemoryBackend {
            index: RwLock::new(InvertedIndex::new()),
            parser: QueryParser::new(),
            scorer: Box::new(FieldLengthScorer::default()),
            highlighter: Highlighter::default(),
            options,
        }
    }

    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.read().contains_key(key)
    }

    /// Copy of the stored document for `key`
    pub fn document(&self, key: &str) -> Option<Document> {
        self.index.read().document_by_key(key).cloned()
    }

    fn execute(&self, request: &SearchRequest) -> Result<ResultSet> {
        let started = Instant::now();
        let limit = request.limit.clamp(1, self.options.max_limit.max(1));
        let offset = request.offset;

        let node = match &request.query {
            QueryInput::Text(text) => self.parser.parse(text),
            QueryInput::Parsed(node) => node.clone(),
        };

        let index = self.index.read();
        let searcher = Searcher {
            index: &index,
            scorer: self.scorer.as_ref(),
            boosts: &self.options.field_boosts,
            enable_fuzzy: self.options.enable_fuzzy,
        };

        let mut hits = searcher.evaluate(&node, &request.fields)?;

        if !request.filters.is_empty() {
            hits.retain(|id, _| {
                index.document(DocId(*id)).is_some_and(|doc| {
                    request.filters.iter().all(|(field, filter)| {
                        doc.get_field(field).is_some_and(|value| filter.matches(value))
                    })
                })
            });
        }

        let total = hits.len();
        let facets = request.wants_facets().then(|| {
            let matched: RoaringBitmap = hits.keys().copied().collect();
            let mut facets = match &request.facet_fields {
                Some(fields) => compute_facets(&index, &matched, fields, DEFAULT_FACET_SIZE),
                None => BTreeMap::new(),
            };
            for (field, buckets) in &request.range_facets {
                facets.insert(field.clone(), compute_range_facet(&index, &matched, field, buckets));
            }
            for (field, interval) in &request.date_histograms {
                facets.insert(field.clone(), compute_date_histogram(&index, &matched, field, *interval));
            }
            facets
        });

        let page = self.paginate(&index, hits, request.sort, offset, limit);

        let terms = if request.highlight { validator::terms(&node) } else { Vec::new() };
        let matches = page
            .into_iter()
            .map(|scored| {
                let doc = index.document(scored.doc_id);
                Match {
                    highlights: doc
                        .filter(|_| request.highlight)
                        .and_then(|d| self.highlighter.highlight_document(d, &request.fields, &terms)),
                    document: doc.filter(|_| request.hydrate).cloned(),
                    key: scored.key,
                    score: clamp_score(scored.score),
                }
            })
            .collect();

        let took_ms = started.elapsed().as_millis() as u64;
        debug!(query = %node, total, took_ms, "search executed");

        Ok(ResultSet {
            matches,
            total,
            offset,
            limit,
            facets,
            suggestions: Vec::new(),
            took_ms,
        })
    }

    fn paginate(
        &self,
        index: &InvertedIndex,
        hits: Hits,
        sort: SortOrder,
        offset: usize,
        limit: usize,
    ) -> Vec<ScoredDocument> {
        let scored = hits.into_iter().filter_map(|(id, score)| {
            let doc_id = DocId(id);
            index.key(doc_id).map(|key| ScoredDocument { doc_id, key: key.to_string(), score })
        });

        if sort == SortOrder::Relevance {
            let mut collector = TopKCollector::new(offset.saturating_add(limit));
            for doc in scored {
                collector.collect(doc);
            }
            return collector.into_sorted().into_iter().skip(offset).collect();
        }

        let mut keyed: Vec<(SortKey, ScoredDocument)> = scored
            .map(|doc| (sort_key(index.document(doc.doc_id), sort), doc))
            .collect();
        keyed.sort_by(|(ka, a), (kb, b)| {
            let primary = match sort {
                SortOrder::DateDesc | SortOrder::TitleDesc | SortOrder::AuthorDesc => kb.cmp(ka),
                _ => ka.cmp(kb),
            };
            primary.then_with(|| a.key.cmp(&b.key))
        });
        keyed.into_iter().skip(offset).take(limit).map(|(_, doc)| doc).collect()
    }
}

impl SearchBackend for MemoryBackend {
    fn index(&self, key: &str, doc: Document) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::index("Cannot index a document with an empty key"));
        }
        self.index.write().insert(key, doc)?;
        Ok(())
    }

    fn index_batch(&self, docs: Vec<Document>) -> Result<usize> {
        let mut index = self.index.write();
        let mut stored = 0;
        for doc in docs {
            let Some(key) = doc.key().map(str::to_string).filter(|k| !k.trim().is_empty()) else {
                warn!("skipping document without a key");
                continue;
            };
            index.insert(&key, doc)?;
            stored += 1;
        }
        Ok(stored)
    }

    fn search(&self, request: &SearchRequest) -> Result<ResultSet> {
        self.execute(request)
    }

    fn delete(&self, key: &str) -> bool {
        self.index.write().remove(key)
    }

    fn clear(&self) {
        self.index.write().clear();
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }

    fn statistics(&self) -> IndexStatistics {
        self.index.read().statistics()
    }

    fn doc_frequency(&self, term: &str) -> usize {
        let index = self.index.read();
        index_tokens(term)
            .iter()
            .filter_map(|token| index.postings(token))
            .map(|postings| postings.len() as usize)
            .min()
            .unwrap_or(0)
    }

    fn suggest(&self, prefix: &str, field: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        let index = self.index.read();
        let Some(values) = index.field_values(field) else {
            return Vec::new();
        };
        values
            .keys()
            .filter(|value| value.to_lowercase().starts_with(&prefix))
            .take(limit)
            .cloned()
            .collect()
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Read-only evaluation of a query tree against one index snapshot
struct Searcher<'a> {
    index: &'a InvertedIndex,
    scorer: &'a dyn Scorer,
    boosts: &'a FieldBoosts,
    enable_fuzzy: bool,
}

impl Searcher<'_> {
    fn evaluate(&self, node: &QueryNode, scope: &[String]) -> Result<Hits> {
        match node {
            QueryNode::Term(q) => Ok(self.term(q, scope)),
            QueryNode::Phrase(q) => Ok(self.phrase(q, scope)),
            QueryNode::Field(q) => self.evaluate(&q.query, std::slice::from_ref(&q.field)),
            QueryNode::Boolean(q) => self.boolean(q, scope),
            QueryNode::Wildcard(q) => self.wildcard(q, scope),
            QueryNode::Fuzzy(q) => Ok(self.fuzzy(q, scope)),
            QueryNode::Range(q) => Ok(self.range(q)),
        }
    }

    /// Fields searched for a document: the scope when given, otherwise every
    /// non-system field
    fn scoped_fields<'d>(
        &self,
        doc: &'d Document,
        scope: &'d [String],
    ) -> Vec<(&'d str, &'d FieldValue)> {
        if scope.is_empty() {
            doc.iter()
                .filter(|(name, _)| !is_system_field(name))
                .map(|(name, value)| (name.as_str(), value))
                .collect()
        } else {
            scope
                .iter()
                .filter_map(|name| doc.get_field(name).map(|value| (name.as_str(), value)))
                .collect()
        }
    }

    /// Length-normalised frequency of `token` summed over the scanned fields
    fn token_score(&self, doc: &Document, token: &str, scope: &[String]) -> f64 {
        self.scoped_fields(doc, scope)
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| {
                let text = value.to_string().to_lowercase();
                let stats = FieldStats {
                    term_freq: term_frequency(&text, token),
                    field_length: text.split_whitespace().count(),
                };
                self.scorer.score(&stats) * self.boosts.get(field)
            })
            .sum()
    }

    /// Whether every token occurs as a whole word in the scoped fields
    fn has_tokens_in_scope(&self, doc: &Document, tokens: &[String], scope: &[String]) -> bool {
        if scope.is_empty() {
            return true;
        }
        let present: HashSet<String> = self
            .scoped_fields(doc, scope)
            .into_iter()
            .flat_map(|(_, value)| index_tokens(&value.to_string()))
            .collect();
        tokens.iter().all(|t| present.contains(t))
    }

    fn postings_intersection(&self, tokens: &[String]) -> RoaringBitmap {
        let mut postings = tokens.iter().map(|t| self.index.postings(t));
        let Some(Some(first)) = postings.next() else {
            return RoaringBitmap::new();
        };
        let mut candidates = first.clone();
        for next in postings {
            match next {
                Some(p) => candidates &= p,
                None => return RoaringBitmap::new(),
            }
        }
        candidates
    }

    fn term(&self, q: &TermQuery, scope: &[String]) -> Hits {
        let tokens = index_tokens(&q.text);
        if tokens.is_empty() {
            return Hits::new();
        }

        let mut hits = Hits::new();
        for id in &self.postings_intersection(&tokens) {
            let Some(doc) = self.index.document(DocId(id)) else { continue };
            if !self.has_tokens_in_scope(doc, &tokens, scope) {
                continue;
            }
            let score: f64 = tokens.iter().map(|t| self.token_score(doc, t, scope)).sum();
            hits.insert(id, score * q.boost);
        }
        hits
    }

    fn phrase(&self, q: &PhraseQuery, scope: &[String]) -> Hits {
        let phrase = q.text.trim().to_lowercase();
        if phrase.is_empty() {
            return Hits::new();
        }
        let words = index_tokens(&phrase);

        let mut hits = Hits::new();
        for id in self.index.all_docs() {
            let Some(doc) = self.index.document(DocId(id)) else { continue };
            let score: f64 = self
                .scoped_fields(doc, scope)
                .into_iter()
                .filter(|(_, value)| {
                    let text = value.to_string().to_lowercase();
                    text.contains(&phrase)
                        || (q.slop > 0 && within_slop(&index_tokens(&text), &words, q.slop))
                })
                .map(|(field, _)| self.boosts.get(field))
                .sum();
            if score > 0.0 {
                hits.insert(id, score * q.boost);
            }
        }
        hits
    }

    fn wildcard(&self, q: &WildcardQuery, scope: &[String]) -> Result<Hits> {
        let pattern: String = q
            .pattern
            .chars()
            .map(|c| match c {
                '*' => ".*".to_string(),
                '?' => ".".to_string(),
                other => regex::escape(&other.to_string()),
            })
            .collect();
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;

        let mut hits = Hits::new();
        for id in self.index.all_docs() {
            let Some(doc) = self.index.document(DocId(id)) else { continue };
            let score: f64 = self
                .scoped_fields(doc, scope)
                .into_iter()
                .filter(|(_, value)| !value.is_empty() && regex.is_match(&value.to_string()))
                .map(|(field, _)| self.boosts.get(field))
                .sum();
            if score > 0.0 {
                hits.insert(id, score * q.boost);
            }
        }
        Ok(hits)
    }

    fn fuzzy(&self, q: &FuzzyQuery, scope: &[String]) -> Hits {
        if !self.enable_fuzzy {
            return self.term(&TermQuery { text: q.term.clone(), boost: q.boost }, scope);
        }

        let automaton = FuzzyAutomaton::new(&q.term, q.max_edits, q.prefix_length as usize);
        if automaton.term().is_empty() {
            return Hits::new();
        }

        let mut hits = Hits::new();
        for (term, postings) in self.index.terms_with_prefix(automaton.prefix()) {
            let Some(distance) = automaton.distance(term) else { continue };
            let token = [term.to_string()];
            for id in postings {
                let Some(doc) = self.index.document(DocId(id)) else { continue };
                if !self.has_tokens_in_scope(doc, &token, scope) {
                    continue;
                }
                let score = self.token_score(doc, term, scope) / (1.0 + distance as f64) * q.boost;
                let entry = hits.entry(id).or_insert(0.0);
                *entry = entry.max(score);
            }
        }
        hits
    }

    fn range(&self, q: &RangeQuery) -> Hits {
        let start = match q.start.as_ref().map(bound_value) {
            Some(None) => return Hits::new(),
            Some(Some(v)) => Some(v),
            None => None,
        };
        let end = match q.end.as_ref().map(bound_value) {
            Some(None) => return Hits::new(),
            Some(Some(v)) => Some(v),
            None => None,
        };

        let mut hits = Hits::new();
        for id in self.index.all_docs() {
            let Some(value) = self
                .index
                .document(DocId(id))
                .and_then(|doc| doc.get_field(&q.field))
                .and_then(comparable_value)
            else {
                continue;
            };

            let above = match start {
                Some(s) if q.include_start => value >= s,
                Some(s) => value > s,
                None => true,
            };
            let below = match end {
                Some(e) if q.include_end => value <= e,
                Some(e) => value < e,
                None => true,
            };
            if above && below {
                hits.insert(id, range_score(value, start, end) * q.boost);
            }
        }
        hits
    }

    fn boolean(&self, q: &BooleanQuery, scope: &[String]) -> Result<Hits> {
        match q.operator {
            BooleanOperator::And => {
                let mut children = q.children.iter();
                let Some(first) = children.next() else {
                    return Ok(Hits::new());
                };
                let mut acc = self.evaluate(first, scope)?;
                for child in children {
                    if acc.is_empty() {
                        break;
                    }
                    let next = self.evaluate(child, scope)?;
                    acc = acc
                        .into_iter()
                        .filter_map(|(id, score)| next.get(&id).map(|s| (id, score + s)))
                        .collect();
                }
                Ok(acc)
            }
            BooleanOperator::Or => {
                let mut acc = Hits::new();
                for child in &q.children {
                    for (id, score) in self.evaluate(child, scope)? {
                        *acc.entry(id).or_insert(0.0) += score;
                    }
                }
                Ok(acc)
            }
            BooleanOperator::Not => match q.children.as_slice() {
                [] => Ok(Hits::new()),
                [only] => {
                    let excluded = self.evaluate(only, scope)?;
                    Ok(self
                        .index
                        .all_docs()
                        .iter()
                        .filter(|id| !excluded.contains_key(id))
                        .map(|id| (id, 1.0))
                        .collect())
                }
                [positive, negatives @ ..] => {
                    let mut acc = self.evaluate(positive, scope)?;
                    for negative in negatives {
                        if acc.is_empty() {
                            break;
                        }
                        let excluded = self.evaluate(negative, scope)?;
                        acc.retain(|id, _| !excluded.contains_key(id));
                    }
                    Ok(acc)
                }
            },
        }
    }
}

/// Whether `words` occur in order with at most `slop` tokens between neighbours
fn within_slop(tokens: &[String], words: &[String], slop: u32) -> bool {
    fn extend(tokens: &[String], words: &[String], from: usize, slop: usize) -> bool {
        let Some((word, rest)) = words.split_first() else {
            return true;
        };
        let window_end = (from + slop + 1).min(tokens.len());
        (from..window_end)
            .filter(|&i| tokens[i] == *word)
            .any(|i| extend(tokens, rest, i + 1, slop))
    }

    let Some((first, rest)) = words.split_first() else {
        return false;
    };
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| *t == first)
        .any(|(i, _)| extend(tokens, rest, i + 1, slop as usize))
}

/// Numeric view of a range bound. Dates become Unix seconds. `None` means
/// the bound cannot be compared at all.
fn bound_value(value: &RangeValue) -> Option<f64> {
    match value {
        RangeValue::Number(n) => Some(*n),
        RangeValue::Text(text) => parse_comparable(text),
    }
}

fn comparable_value(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Float(f) => Some(*f),
        FieldValue::Text(text) => parse_comparable(text),
        FieldValue::Boolean(_) | FieldValue::List(_) => None,
    }
}

fn parse_comparable(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>()
        && n.is_finite()
    {
        return Some(n);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp() as f64);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp() as f64)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Year(i64),
    Text(String),
}

fn sort_key(doc: Option<&Document>, sort: SortOrder) -> SortKey {
    match sort {
        SortOrder::DateAsc | SortOrder::DateDesc | SortOrder::Relevance => SortKey::Year(
            doc.and_then(|d| d.get_field("year"))
                .and_then(FieldValue::as_f64)
                .map(|y| y as i64)
                .unwrap_or(MISSING_YEAR),
        ),
        SortOrder::TitleAsc | SortOrder::TitleDesc => {
            SortKey::Text(doc.and_then(|d| d.text("title")).map(title_sort_key).unwrap_or_default())
        }
        SortOrder::AuthorAsc | SortOrder::AuthorDesc => {
            SortKey::Text(doc.and_then(|d| d.text("author")).map(author_sort_key).unwrap_or_default())
        }
    }
}

/// Lowercased title without a leading article
fn title_sort_key(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = lower.strip_prefix(article) {
            return rest.to_string();
        }
    }
    lower
}

/// Surname first: the part before a comma, or the last word
fn author_sort_key(author: &str) -> String {
    let lower = author.trim().to_lowercase();
    if let Some((surname, _)) = lower.split_once(',') {
        return surname.trim().to_string();
    }
    match lower.split_whitespace().last() {
        Some(last) => format!("{}|{}", last, lower),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::facets::{DateInterval, RangeBucket};
    use crate::search::results::FacetValue;

    fn backend() -> MemoryBackend {
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
                    .with_field("author", "Doe, John")
                    .with_field("year", 2023i64),
            )
            .unwrap();
        backend
            .index(
                "c",
                Document::new()
                    .with_field("key", "c")
                    .with_field("title", "The Art of Graph Theory")
                    .with_field("note", "machine checked proofs")
                    .with_field("year", 1998i64),
            )
            .unwrap();
        backend
    }

    fn keys(backend: &MemoryBackend, request: SearchRequest) -> Vec<String> {
        let mut keys: Vec<String> =
            backend.search(&request).unwrap().matches.into_iter().map(|m| m.key).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_term_and_semantics() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("machine learning")), vec!["a"]);
        assert_eq!(keys(&b, SearchRequest::new("learning")), vec!["a", "b"]);
        assert!(keys(&b, SearchRequest::new("machine AND missingword")).is_empty());
    }

    #[test]
    fn test_title_outscores_note() {
        let b = backend();
        let results = b.search(&SearchRequest::new("machine")).unwrap();
        assert_eq!(results.matches[0].key, "a");
        assert!(results.matches[0].score > results.matches[1].score);
    }

    #[test]
    fn test_field_scope() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("title:machine")), vec!["a"]);
        assert_eq!(keys(&b, SearchRequest::new("note:machine")), vec!["c"]);
        assert_eq!(keys(&b, SearchRequest::new("machine").fields(["note"])), vec!["c"]);
    }

    #[test]
    fn test_phrase_and_slop() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("\"deep learning\"")), vec!["b"]);
        assert!(keys(&b, SearchRequest::new("\"deep networks\"")).is_empty());
        assert_eq!(keys(&b, SearchRequest::new("\"learning neural\"~1")), vec!["b"]);
    }

    #[test]
    fn test_boolean_not() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("learning NOT deep")), vec!["a"]);
        assert_eq!(keys(&b, SearchRequest::new("NOT learning")), vec!["c"]);
        assert!(keys(&b, SearchRequest::new("learning NOT learning")).is_empty());
        assert_eq!(keys(&b, SearchRequest::new("graph OR deep")), vec!["b", "c"]);
    }

    #[test]
    fn test_wildcard() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("neur*")), vec!["b"]);
        assert_eq!(keys(&b, SearchRequest::new("title:gr?ph")), vec!["c"]);
    }

    #[test]
    fn test_ranges() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("year:[2023 TO 2024]")), vec!["a", "b"]);
        assert!(keys(&b, SearchRequest::new("year:{2023 TO 2024}")).is_empty());
        assert_eq!(keys(&b, SearchRequest::new("year:[* TO 2000]")), vec!["c"]);
        assert!(keys(&b, SearchRequest::new("year:[soon TO 2024]")).is_empty());
    }

    #[test]
    fn test_range_midpoint_bonus() {
        let b = backend();
        let results = b.search(&SearchRequest::new("year:[2022 TO 2024]")).unwrap();
        let score = |key: &str| results.matches.iter().find(|m| m.key == key).unwrap().score;
        assert!(score("b") > score("a"));
    }

    #[test]
    fn test_fuzzy_edit_distance() {
        let b = backend();
        assert_eq!(keys(&b, SearchRequest::new("lerning~1")), vec!["a", "b"]);
        assert!(keys(&b, SearchRequest::new("lrnng~1")).is_empty());

        let strict = MemoryBackend::with_options(BackendOptions { enable_fuzzy: false, ..Default::default() });
        strict.index("a", Document::new().with_field("title", "Learning")).unwrap();
        assert!(keys(&strict, SearchRequest::new("lerning~1")).is_empty());
        assert_eq!(keys(&strict, SearchRequest::new("learning~1")), vec!["a"]);
    }

    #[test]
    fn test_filters_facets_and_pagination() {
        let b = backend();
        let results = b
            .search(&SearchRequest::new("learning").filter("year", 2023i64).facets(["year"]))
            .unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.matches[0].key, "b");
        let years = &results.facets.unwrap()["year"];
        assert_eq!(years[0].value, "2023");

        let first = b.search(&SearchRequest::new("NOT zzz").limit(1)).unwrap();
        let second = b.search(&SearchRequest::new("NOT zzz").limit(1).offset(1)).unwrap();
        assert_eq!(first.total, 3);
        assert_ne!(first.matches[0].key, second.matches[0].key);
    }

    #[test]
    fn test_range_and_date_facets() {
        let b = backend();
        let request = SearchRequest::new("NOT zzz")
            .range_facet(
                "year",
                vec![RangeBucket::new(None, Some(2000.0)), RangeBucket::new(Some(2000.0), None)],
            )
            .date_histogram("year", DateInterval::Year);
        assert!(request.facet_fields.is_none());

        let results = b.search(&request.clone()).unwrap();
        let facets = results.facets.unwrap();
        assert_eq!(
            facets["year"].iter().map(|f| f.value.as_str()).collect::<Vec<_>>(),
            vec!["1998", "2023", "2024"]
        );

        let results = b.search(&SearchRequest { date_histograms: BTreeMap::new(), ..request }).unwrap();
        let years = &results.facets.unwrap()["year"];
        assert_eq!(years[0], FacetValue { value: "< 2000".into(), count: 1 });
        assert_eq!(years[1], FacetValue { value: ">= 2000".into(), count: 2 });
    }

    #[test]
    fn test_sort_orders() {
        let b = backend();
        let sorted = |sort: SortOrder| -> Vec<String> {
            b.search(&SearchRequest::new("NOT zzz").sort(sort))
                .unwrap()
                .matches
                .into_iter()
                .map(|m| m.key)
                .collect()
        };
        assert_eq!(sorted(SortOrder::DateAsc), vec!["c", "b", "a"]);
        assert_eq!(sorted(SortOrder::DateDesc), vec!["a", "b", "c"]);
        assert_eq!(sorted(SortOrder::TitleAsc), vec!["c", "b", "a"]);
        assert_eq!(sorted(SortOrder::AuthorAsc), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_highlight_and_hydrate() {
        let b = backend();
        let results = b
            .search(&SearchRequest::new("deep").highlight(true).hydrate(true))
            .unwrap();
        let m = &results.matches[0];
        assert_eq!(
            m.highlights.as_ref().unwrap()["title"],
            vec!["<mark>Deep</mark> Learning with Neural Networks"]
        );
        assert_eq!(m.document.as_ref().unwrap().key(), Some("b"));
    }

    #[test]
    fn test_delete_suggest_and_stats() {
        let b = backend();
        assert_eq!(b.suggest("mach", "title", 5), vec!["Machine Learning Fundamentals"]);
        assert!(b.delete("a"));
        assert!(!b.delete("a"));
        assert!(keys(&b, SearchRequest::new("fundamentals")).is_empty());
        assert_eq!(b.statistics().documents, 2);

        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.statistics().terms, 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        let b = backend();
        let results = b.search(&SearchRequest::new("NOT zzz").limit(0)).unwrap();
        assert_eq!(results.limit, 1);
        assert_eq!(results.matches.len(), 1);
    }

    #[test]
    fn test_within_slop() {
        let tokens: Vec<String> = ["a", "b", "b", "x", "c"].iter().map(|s| s.to_string()).collect();
        let words: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert!(within_slop(&tokens, &words, 1));
        assert!(!within_slop(&tokens, &words, 0));
    }

    #[test]
    fn test_sort_key_helpers() {
        assert_eq!(title_sort_key("The Art of War"), "art of war");
        assert_eq!(author_sort_key("Doe, John"), "doe");
        assert_eq!(author_sort_key("Jane Smith"), "smith|jane smith");
    }
}
