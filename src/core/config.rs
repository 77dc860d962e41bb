use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::schema::schema::SchemaOverrides;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_limit: usize,                  // Upper clamp for request limits
    pub default_limit: usize,
    pub batch_size: usize,                 // Records per indexing batch
    pub query_cache_size: usize,           // Parsed-query LRU entries

    pub expand_queries: bool,              // Spelling/synonym/field rewrites before search
    pub enable_highlighting: bool,
    pub enable_facets: bool,
    pub enable_suggestions: bool,
    pub rerank: bool,                      // BM25 pass over relevance-sorted results
    pub facet_fields: Option<Vec<String>>, // None = keyword fields from the schema

    pub field_boosts: BTreeMap<String, f64>,  // Backend scoring boosts
    pub default_field_boost: f64,

    pub synonyms: HashMap<String, Vec<String>>,  // Extra or replacement synonym entries
    pub dictionary_words: Vec<String>,           // Extra spell-checker vocabulary
    pub schema: SchemaOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_limit: 1000,
            default_limit: 20,
            batch_size: 100,
            query_cache_size: 256,

            expand_queries: false,
            enable_highlighting: true,
            enable_facets: true,
            enable_suggestions: true,
            rerank: true,
            facet_fields: None,

            field_boosts: default_field_boosts(),
            default_field_boost: 0.8,

            synonyms: HashMap::new(),
            dictionary_words: Vec::new(),
            schema: SchemaOverrides::default(),
        }
    }
}

pub fn default_field_boosts() -> BTreeMap<String, f64> {
    [
        ("title", 2.0),
        ("author", 1.5),
        ("keywords", 1.2),
        ("abstract", 1.0),
        ("journal", 1.0),
        ("note", 0.5),
    ]
    .into_iter()
    .map(|(f, b)| (f.to_string(), b))
    .collect()
}

impl Config {
    /// Missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Config::from_json_str(&contents)
    }

    /// Clamp a requested limit into `[1, max_limit]`
    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.max_limit.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{"max_limit": 50, "expand_queries": true}"#).unwrap();
        assert_eq!(config.max_limit, 50);
        assert!(config.expand_queries);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.field_boosts.get("title"), Some(&2.0));
    }

    #[test]
    fn test_clamp_limit() {
        let config = Config::default();
        assert_eq!(config.clamp_limit(0), 1);
        assert_eq!(config.clamp_limit(5000), 1000);
        assert_eq!(config.clamp_limit(20), 20);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/bibdex.json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
    }
}
