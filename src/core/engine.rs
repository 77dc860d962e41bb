use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use crate::analysis::spelling::SpellChecker;
use crate::analysis::synonyms::SynonymExpander;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::stats::EngineStatistics;
use crate::query::ast::QueryNode;
use crate::query::cache::ParseCache;
use crate::query::expander::{ExpansionOptions, QueryExpander, SuggestionKind};
use crate::query::parser::QueryParser;
use crate::query::validator;
use crate::schema::schema::FieldConfiguration;
use crate::scoring::ranker::{Bm25Ranker, Ranker, RankingContext};
use crate::scoring::scorer::FieldBoosts;
use crate::search::backend::SearchBackend;
use crate::search::executor::{BackendOptions, MemoryBackend};
use crate::search::facets::{DateInterval, RangeBucket};
use crate::search::request::{FilterValue, QueryInput, SearchRequest, SortOrder};
use crate::search::results::{Match, ResultSet, SearchSuggestion};
use crate::writer::batch::IndexingPipeline;
use crate::writer::indexer::RecordIndexer;
use crate::writer::record::BibliographicRecord;

const MAX_SUGGESTIONS: usize = 3;
const MAX_CORRECTIONS: usize = 2;
const RELAX_BELOW: usize = 3;
const FIELD_HINT_BELOW: usize = 5;

/// Per-call knobs for [`SearchEngine::search`]. Unset values fall back to the
/// engine configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub offset: usize,
    pub fields: Vec<String>,
    pub facets: Option<Vec<String>>,
    pub highlight: Option<bool>,
    pub sort: SortOrder,
    pub filters: BTreeMap<String, FilterValue>,
    pub hydrate: bool,
    pub range_facets: BTreeMap<String, Vec<RangeBucket>>,
    pub date_histograms: BTreeMap<String, DateInterval>,
}

/// Indexing and search facade over one backend
pub struct SearchEngine {
    config: Config,
    schema: Arc<FieldConfiguration>,
    pipeline: Mutex<IndexingPipeline>,
    backend: Arc<dyn SearchBackend>,
    parser: QueryParser,
    parse_cache: ParseCache,
    expander: QueryExpander,
    ranker: Option<Box<dyn Ranker>>,  // Applied to relevance-sorted results before pagination

    // Metrics
    start_time: Instant,
    query_count: AtomicU64,
    write_count: AtomicU64,
}

impl SearchEngine {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Engine over a fresh [`MemoryBackend`]
    pub fn with_config(config: Config) -> Result<Self> {
        let schema = FieldConfiguration::with_overrides(&config.schema)?;
        let backend = Arc::new(MemoryBackend::with_options(BackendOptions::from_config(
            &config,
            schema.enable_fuzzy,
        )));
        Self::build(config, schema, backend)
    }

    pub fn with_backend(config: Config, backend: Arc<dyn SearchBackend>) -> Result<Self> {
        let schema = FieldConfiguration::with_overrides(&config.schema)?;
        Self::build(config, schema, backend)
    }

    fn build(config: Config, schema: FieldConfiguration, backend: Arc<dyn SearchBackend>) -> Result<Self> {
        let expander = QueryExpander::with_components(
            SpellChecker::with_words(&config.dictionary_words)?,
            SynonymExpander::with_custom(&config.synonyms),
        );
        let schema = Arc::new(schema);
        let indexer = RecordIndexer::new((*schema).clone());
        let ranker = config
            .rerank
            .then(|| Box::new(Bm25Ranker::new(FieldBoosts::from_config(&config))) as Box<dyn Ranker>);

        info!(backend = backend.name(), "search engine ready");

        Ok(SearchEngine {
            pipeline: Mutex::new(IndexingPipeline::new(indexer, config.batch_size)),
            parse_cache: ParseCache::new(config.query_cache_size),
            parser: QueryParser::new(),
            expander,
            ranker,
            schema,
            backend,
            config,
            start_time: Instant::now(),
            query_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn schema(&self) -> &FieldConfiguration {
        &self.schema
    }

    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    /// Replace the re-ranking stage
    pub fn with_ranker(mut self, ranker: Box<dyn Ranker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    /// Keep backend order for relevance-sorted results
    pub fn without_ranker(mut self) -> Self {
        self.ranker = None;
        self
    }

    pub fn ranker(&self) -> Option<&dyn Ranker> {
        self.ranker.as_deref()
    }

    pub fn index_record<R: BibliographicRecord + ?Sized>(&self, record: &R) -> Result<()> {
        let doc = self.pipeline.lock().indexer.index_record(record)?;
        self.backend.index(record.key().trim(), doc)?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Index every record that converts and validates. Failing records are
    /// logged and skipped; returns how many were stored.
    pub fn index_records<R: BibliographicRecord>(&self, records: &[R]) -> Result<usize> {
        let mut pipeline = self.pipeline.lock();
        let mut stored = 0;

        for chunk in records.chunks(pipeline.batch_size) {
            let docs = pipeline.process_records(chunk, true);
            stored += self.backend.index_batch(docs)?;
        }

        self.write_count.fetch_add(stored as u64, Ordering::Relaxed);
        info!(records = records.len(), stored, "batch indexed");
        Ok(stored)
    }

    pub fn remove_by_key(&self, key: &str) -> bool {
        let removed = self.backend.delete(key);
        if removed {
            self.write_count.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn clear_all(&self) {
        self.backend.clear();
        self.parse_cache.clear();
        self.pipeline.lock().reset_statistics();
    }

    pub fn commit(&self) -> Result<()> {
        self.backend.commit()
    }

    /// Search with configuration defaults filled in
    pub fn search(&self, query: &str, options: SearchOptions) -> ResultSet {
        let facet_fields = options.facets.or_else(|| {
            self.config.enable_facets.then(|| match &self.config.facet_fields {
                Some(fields) => fields.clone(),
                None => self.schema.facet_fields().into_iter().map(str::to_string).collect(),
            })
        });

        let request = SearchRequest {
            query: QueryInput::Text(query.to_string()),
            limit: options.limit.unwrap_or(self.config.default_limit),
            offset: options.offset,
            fields: options.fields,
            facet_fields,
            highlight: options.highlight.unwrap_or(self.config.enable_highlighting),
            sort: options.sort,
            filters: options.filters,
            hydrate: options.hydrate,
            range_facets: options.range_facets,
            date_histograms: options.date_histograms,
        };
        self.search_request(request)
    }

    /// Execute `request`. Backend failures come back as an empty result
    /// carrying an error suggestion.
    pub fn search_request(&self, mut request: SearchRequest) -> ResultSet {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        request.limit = self.config.clamp_limit(request.limit);

        let (text, parsed) = match &request.query {
            QueryInput::Text(text) => {
                let node = self.parse_cache.get_or_insert_with(text, || self.parser.parse(text));
                (text.clone(), node)
            }
            QueryInput::Parsed(node) => (node.to_string(), node.clone()),
        };

        let executed = if self.config.expand_queries {
            let options = ExpansionOptions {
                expand_synonyms: self.schema.enable_synonyms,
                ..Default::default()
            };
            self.expander.expand(&parsed, options)
        } else {
            parsed.clone()
        };
        debug!(query = %text, executed = %executed, "searching");

        // Re-ranking needs the whole window hydrated; the page is cut after.
        let (offset, limit, hydrate) = (request.offset, request.limit, request.hydrate);
        let window = self.config.max_limit.max(1);
        let rankable = request.sort == SortOrder::Relevance && offset.saturating_add(limit) <= window;
        let ranking = match &self.ranker {
            Some(ranker) if rankable => {
                let terms = ranking_terms(&executed);
                (!terms.is_empty()).then_some((&**ranker, terms))
            }
            _ => None,
        };
        if ranking.is_some() {
            request.offset = 0;
            request.limit = window;
            request.hydrate = true;
        }
        request.query = QueryInput::Parsed(executed);

        match self.backend.search(&request) {
            Ok(mut results) => {
                if let Some((ranker, terms)) = &ranking {
                    self.rerank(*ranker, terms, &mut results);
                    let window = std::mem::take(&mut results.matches);
                    results.matches = paginate(window, offset, limit, hydrate);
                    results.offset = offset;
                    results.limit = limit;
                }
                if self.config.enable_suggestions {
                    results.suggestions = self.suggestions(&text, &parsed, results.total);
                }
                results
            }
            Err(err) => {
                warn!(query = %text, error = %err, "search failed");
                let mut results = ResultSet::empty(offset, limit);
                results.suggestions.push(SearchSuggestion {
                    suggestion: text,
                    kind: SuggestionKind::Error,
                    confidence: SuggestionKind::Error.confidence(),
                    description: format!("Search error: {}", err),
                });
                results
            }
        }
    }

    fn rerank(&self, ranker: &dyn Ranker, terms: &[String], results: &mut ResultSet) {
        let ctx = RankingContext {
            total_docs: self.backend.statistics().documents,
            doc_frequencies: terms
                .iter()
                .map(|term| (term.clone(), self.backend.doc_frequency(term)))
                .collect(),
        };
        ranker.rank(&mut results.matches, terms, &ctx);
        debug!(ranker = ranker.name(), window = results.matches.len(), "re-ranked results");
    }

    fn suggestions(&self, text: &str, node: &QueryNode, total: usize) -> Vec<SearchSuggestion> {
        let mut suggestions: Vec<SearchSuggestion> = self
            .expander
            .suggest_corrections(node, MAX_CORRECTIONS)
            .into_iter()
            .map(|s| SearchSuggestion {
                suggestion: s.suggested,
                kind: s.kind,
                confidence: s.confidence,
                description: s.explanation,
            })
            .collect();

        if total < RELAX_BELOW {
            let relaxed = self.expander.relax(node, 1);
            if relaxed != *node {
                suggestions.push(SearchSuggestion {
                    suggestion: relaxed.to_string(),
                    kind: SuggestionKind::Relaxation,
                    confidence: SuggestionKind::Relaxation.confidence(),
                    description: "Try a broader search with relaxed constraints".to_string(),
                });
            }
        }

        if total < FIELD_HINT_BELOW && text.contains(':') {
            suggestions.push(SearchSuggestion {
                suggestion: text.replace(':', " "),
                kind: SuggestionKind::FieldExpansion,
                confidence: SuggestionKind::FieldExpansion.confidence(),
                description: "Search across all fields instead of specific field".to_string(),
            });
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    pub fn suggest(&self, prefix: &str, field: &str, limit: usize) -> Vec<String> {
        self.backend.suggest(prefix, field, limit)
    }

    /// Problems found in the parsed form of `query`; empty when valid
    pub fn validate_query(&self, query: &str) -> Vec<String> {
        validator::validate(&self.parser.parse(query))
    }

    pub fn statistics(&self) -> EngineStatistics {
        EngineStatistics::new(
            self.backend.name(),
            self.start_time.elapsed().as_secs(),
            self.backend.statistics(),
            self.parse_cache.stats(),
            self.query_count.load(Ordering::Relaxed),
            self.write_count.load(Ordering::Relaxed),
            self.pipeline.lock().statistics(),
        )
    }
}

/// Distinct lowercased words the ranker scores against
fn ranking_terms(node: &QueryNode) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in validator::terms(node) {
        let term = term.to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

fn paginate(matches: Vec<Match>, offset: usize, limit: usize, hydrate: bool) -> Vec<Match> {
    matches
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|mut m| {
            if !hydrate {
                m.document = None;
            }
            m
        })
        .collect()
}
