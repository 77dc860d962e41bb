use std::collections::{HashMap, HashSet};
use serde::{Serialize, Deserialize};
use crate::analysis::analyzer::Analyzer;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::ngram::NGramFilter;
use crate::analysis::filters::stopword::ENGLISH_STOPWORDS;
use crate::analysis::token::{join_tokens, Token};
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Switches for one text-processing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub lowercase: bool,
    pub remove_accents: bool,
    pub split_camelcase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub stopwords: Option<HashSet<String>>,  // None = English list
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            lowercase: true,
            remove_accents: true,
            split_camelcase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 2,
            max_token_length: 50,
            stopwords: None,
        }
    }
}

impl AnalyzerConfig {
    /// Lowercase only
    pub fn exact() -> Self {
        AnalyzerConfig {
            remove_accents: false,
            split_camelcase: false,
            remove_stopwords: false,
            stem: false,
            ..AnalyzerConfig::default()
        }
    }

    /// Lowercase and accent folding, single characters kept
    pub fn keyword() -> Self {
        AnalyzerConfig {
            split_camelcase: false,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            ..AnalyzerConfig::default()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(AnalyzerConfig::default()),
            "exact" => Some(AnalyzerConfig::exact()),
            "keyword" => Some(AnalyzerConfig::keyword()),
            _ => None,
        }
    }

    pub fn stopword_list(&self) -> Vec<String> {
        match &self.stopwords {
            Some(words) => words.iter().cloned().collect(),
            None => ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Configurable normalization pipeline producing space-joined tokens
pub struct TextProcessor {
    default: Analyzer,
    presets: HashMap<&'static str, Analyzer>,
}

impl TextProcessor {
    pub fn new(config: AnalyzerConfig) -> Self {
        let presets = [
            ("default", AnalyzerConfig::default()),
            ("exact", AnalyzerConfig::exact()),
            ("keyword", AnalyzerConfig::keyword()),
        ]
        .into_iter()
        .map(|(name, cfg)| (name, Analyzer::from_config(name, &cfg)))
        .collect();

        TextProcessor {
            default: Analyzer::from_config("processor", &config),
            presets,
        }
    }

    /// Run the pipeline; `preset` selects a named configuration, unknown names fall back to this processor's own
    pub fn process(&self, text: &str, preset: Option<&str>) -> String {
        if text.is_empty() {
            return String::new();
        }
        let analyzer = preset
            .and_then(|name| self.presets.get(name))
            .unwrap_or(&self.default);
        join_tokens(&analyzer.analyze(text))
    }

    /// Raw tokens, no normalization
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        StandardTokenizer.tokenize(text).into_iter().map(|t| t.text).collect()
    }

    /// Space-joined character n-grams of each lowercased word.
    /// Empty when the whole text is shorter than `n`.
    pub fn generate_ngrams(&self, text: &str, n: usize) -> String {
        if n == 0 || text.chars().count() < n {
            return String::new();
        }
        let lowered = text.to_lowercase();
        let words: Vec<Token> = lowered.split_whitespace()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect();
        join_tokens(&NGramFilter::new(n, n).filter(words))
    }

    /// Top `max` processed tokens by frequency, ties broken by first occurrence
    pub fn extract_keywords(&self, text: &str, max: usize) -> Vec<String> {
        let processed = self.process(text, None);
        let mut counts: Vec<(String, usize)> = Vec::new();
        for token in processed.split_whitespace() {
            match counts.iter_mut().find(|(t, _)| t == token) {
                Some((_, count)) => *count += 1,
                None => counts.push((token.to_string(), 1)),
            }
        }
        // Stable sort keeps first-seen order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().take(max).map(|(t, _)| t).collect()
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        TextProcessor::new(AnalyzerConfig::default())
    }
}
