use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::core::types::FieldValue;
use crate::query::ast::QueryNode;
use crate::search::facets::{DateInterval, RangeBucket};

/// Query text to be parsed by the backend, or an already parsed tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryInput {
    Text(String),
    Parsed(QueryNode),
}

impl From<&str> for QueryInput {
    fn from(text: &str) -> Self {
        QueryInput::Text(text.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(text: String) -> Self {
        QueryInput::Text(text)
    }
}

impl From<QueryNode> for QueryInput {
    fn from(node: QueryNode) -> Self {
        QueryInput::Parsed(node)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    DateDesc,
    DateAsc,
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    AuthorDesc,
}

/// Post-filter on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Exact(FieldValue),
    AnyOf(Vec<FieldValue>),
}

impl FilterValue {
    /// List fields pass when any element matches
    pub fn matches(&self, value: &FieldValue) -> bool {
        match self {
            FilterValue::Exact(expected) => values_equal(value, expected),
            FilterValue::AnyOf(options) => options.iter().any(|o| values_equal(value, o)),
        }
    }
}

fn values_equal(value: &FieldValue, expected: &FieldValue) -> bool {
    match (value, expected) {
        (FieldValue::List(items), FieldValue::Text(t)) => items.iter().any(|i| i == t),
        (FieldValue::Integer(a), FieldValue::Float(b)) | (FieldValue::Float(b), FieldValue::Integer(a)) => {
            *a as f64 == *b
        }
        (a, b) => a == b,
    }
}

impl From<FieldValue> for FilterValue {
    fn from(value: FieldValue) -> Self {
        FilterValue::Exact(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Exact(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Exact(value.into())
    }
}

/// One search invocation against a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: QueryInput,
    pub limit: usize,
    pub offset: usize,
    pub fields: Vec<String>,               // Empty = every field
    pub facet_fields: Option<Vec<String>>,
    pub highlight: bool,
    pub sort: SortOrder,
    pub filters: BTreeMap<String, FilterValue>,
    pub hydrate: bool,                     // Attach document copies to matches
    #[serde(default)]
    pub range_facets: BTreeMap<String, Vec<RangeBucket>>,
    #[serde(default)]
    pub date_histograms: BTreeMap<String, DateInterval>,
}

impl SearchRequest {
    pub fn new(query: impl Into<QueryInput>) -> Self {
        SearchRequest {
            query: query.into(),
            limit: 20,
            offset: 0,
            fields: Vec::new(),
            facet_fields: None,
            highlight: false,
            sort: SortOrder::Relevance,
            filters: BTreeMap::new(),
            hydrate: false,
            range_facets: BTreeMap::new(),
            date_histograms: BTreeMap::new(),
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn facets<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Count matches of `field` per numeric bucket
    pub fn range_facet(mut self, field: impl Into<String>, buckets: Vec<RangeBucket>) -> Self {
        self.range_facets.insert(field.into(), buckets);
        self
    }

    /// Count matches of a date-valued `field` per calendar bucket
    pub fn date_histogram(mut self, field: impl Into<String>, interval: DateInterval) -> Self {
        self.date_histograms.insert(field.into(), interval);
        self
    }

    /// Whether any facet kind was asked for
    pub fn wants_facets(&self) -> bool {
        self.facet_fields.is_some() || !self.range_facets.is_empty() || !self.date_histograms.is_empty()
    }

    pub fn highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = hydrate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = SearchRequest::new("rust")
            .limit(5)
            .offset(10)
            .fields(["title"])
            .filter("entry_type", "article")
            .sort(SortOrder::DateDesc);

        assert_eq!(request.query, QueryInput::Text("rust".into()));
        assert_eq!(request.limit, 5);
        assert_eq!(request.offset, 10);
        assert_eq!(request.fields, vec!["title"]);
        assert_eq!(request.sort, SortOrder::DateDesc);
        assert!(request.filters.contains_key("entry_type"));
    }

    #[test]
    fn test_filter_matching() {
        let exact = FilterValue::from("article");
        assert!(exact.matches(&FieldValue::from("article")));
        assert!(!exact.matches(&FieldValue::from("book")));

        let any = FilterValue::AnyOf(vec![FieldValue::Integer(2023), FieldValue::Integer(2024)]);
        assert!(any.matches(&FieldValue::Integer(2024)));
        assert!(any.matches(&FieldValue::Float(2023.0)));

        let tag = FilterValue::from("ml");
        assert!(tag.matches(&FieldValue::List(vec!["ml".into(), "nlp".into()])));
    }
}
