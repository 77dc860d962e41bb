use std::collections::HashMap;
use std::sync::Arc;
use crate::analysis::filter::{CharFilter, TokenFilter};
use crate::analysis::filters::accent::AccentFilter;
use crate::analysis::filters::camelcase::CamelCaseFilter;
use crate::analysis::filters::length::LengthFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::processor::AnalyzerConfig;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{AuthorTokenizer, KeywordTokenizer, StandardTokenizer, Tokenizer};
use crate::core::error::{Error, ErrorKind, Result};

/// Text analysis pipeline
pub struct Analyzer {
    pub name: String,
    pub char_filters: Vec<Box<dyn CharFilter>>,
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
}

impl Analyzer {
    pub fn new(name: impl Into<String>, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            name: name.into(),
            char_filters: Vec::new(),
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn add_char_filter(mut self, filter: Box<dyn CharFilter>) -> Self {
        self.char_filters.push(filter);
        self
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut text = text.to_string();
        for char_filter in &self.char_filters {
            text = char_filter.apply(&text);
        }

        let mut tokens = self.tokenizer.tokenize(&text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    pub fn analyze_terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|t| t.text).collect()
    }

    /// Build the standard-tokenizer pipeline described by `config`
    pub fn from_config(name: &str, config: &AnalyzerConfig) -> Self {
        let mut analyzer = Analyzer::new(name, Box::new(StandardTokenizer));

        if config.split_camelcase {
            analyzer = analyzer.add_char_filter(Box::new(CamelCaseFilter));
        }
        if config.remove_accents {
            analyzer = analyzer.add_char_filter(Box::new(AccentFilter));
        }

        analyzer = analyzer.add_filter(Box::new(LengthFilter::new(
            config.min_token_length,
            config.max_token_length,
        )));
        if config.lowercase {
            analyzer = analyzer.add_filter(Box::new(LowercaseFilter));
        }
        if config.remove_stopwords {
            analyzer = analyzer.add_filter(Box::new(StopWordFilter::new(config.stopword_list())));
        }
        if config.stem {
            analyzer = analyzer.add_filter(Box::new(StemmerFilter::english()));
        }

        analyzer
    }

    /// Tokenize and lowercase
    pub fn simple() -> Self {
        Analyzer::from_config("simple", &AnalyzerConfig::exact())
    }

    /// Accent folding and stopword removal, no stemming
    pub fn standard() -> Self {
        Analyzer::from_config("standard", &AnalyzerConfig {
            split_camelcase: false,
            stem: false,
            ..AnalyzerConfig::default()
        })
    }

    /// Full pipeline
    pub fn stemming() -> Self {
        Analyzer::from_config("stemming", &AnalyzerConfig::default())
    }

    /// Whole value as one lowercase token
    pub fn keyword() -> Self {
        Analyzer::new("keyword", Box::new(KeywordTokenizer))
            .add_filter(Box::new(LowercaseFilter))
    }

    pub fn author() -> Self {
        Analyzer::new("author", Box::new(AuthorTokenizer))
    }
}

const FIELD_ANALYZERS: &[(&str, &str)] = &[
    ("title", "stemming"),
    ("abstract", "stemming"),
    ("keywords", "stemming"),
    ("content", "stemming"),
    ("note", "standard"),
    ("author", "author"),
    ("editor", "author"),
    ("journal", "keyword"),
    ("booktitle", "keyword"),
    ("publisher", "keyword"),
    ("series", "keyword"),
    ("school", "keyword"),
    ("institution", "keyword"),
    ("organization", "keyword"),
    ("doi", "keyword"),
    ("isbn", "keyword"),
    ("issn", "keyword"),
    ("url", "keyword"),
];

pub const DEFAULT_ANALYZER: &str = "standard";

/// Registry for managing analyzers and the field to analyzer table
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<Analyzer>>,
    field_analyzers: HashMap<String, String>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        let mut registry = AnalyzerRegistry {
            analyzers: HashMap::new(),
            field_analyzers: FIELD_ANALYZERS.iter()
                .map(|(f, a)| (f.to_string(), a.to_string()))
                .collect(),
        };

        registry.register("simple", Analyzer::simple());
        registry.register("standard", Analyzer::standard());
        registry.register("stemming", Analyzer::stemming());
        registry.register("keyword", Analyzer::keyword());
        registry.register("author", Analyzer::author());
        registry
    }

    pub fn register(&mut self, name: &str, analyzer: Analyzer) {
        self.analyzers.insert(name.to_string(), Arc::new(analyzer));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Analyzer>> {
        self.analyzers.get(name).cloned()
    }

    pub fn set_field_analyzer(&mut self, field: &str, analyzer_name: &str) -> Result<()> {
        if !self.analyzers.contains_key(analyzer_name) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Analyzer '{}' not found", analyzer_name),
            ));
        }
        self.field_analyzers.insert(field.to_string(), analyzer_name.to_string());
        Ok(())
    }

    pub fn analyzer_name_for_field(&self, field: &str) -> &str {
        self.field_analyzers.get(field).map(String::as_str).unwrap_or(DEFAULT_ANALYZER)
    }

    /// Analyzer for `field`, falling back to the standard analyzer
    pub fn analyzer_for_field(&self, field: &str) -> Arc<Analyzer> {
        self.get(self.analyzer_name_for_field(field))
            .or_else(|| self.get(DEFAULT_ANALYZER))
            .unwrap_or_else(|| Arc::new(Analyzer::standard()))
    }

    pub fn analyze_field(&self, field: &str, text: &str) -> Vec<String> {
        self.analyzer_for_field(field).analyze_terms(text)
    }

    pub fn analyze(&self, analyzer_name: &str, text: &str) -> Result<Vec<Token>> {
        self.get(analyzer_name)
            .map(|analyzer| analyzer.analyze(text))
            .ok_or_else(|| Error::new(
                ErrorKind::NotFound,
                format!("Analyzer '{}' not found", analyzer_name),
            ))
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
