use std::collections::BTreeMap;
use regex::{Regex, RegexBuilder};
use crate::core::types::Document;
use crate::index::inverted::is_system_field;

/// Wraps query-term occurrences in `<tag>...</tag>`
#[derive(Debug, Clone)]
pub struct Highlighter {
    pub tag: String,
    pub snippet_length: usize, // Characters kept around the first hit in long fields
}

impl Default for Highlighter {
    fn default() -> Self {
        Highlighter {
            tag: "mark".to_string(),
            snippet_length: 200,
        }
    }
}

/// Fields produced by indexing rather than copied from the record
pub fn is_derived_field(field: &str) -> bool {
    is_system_field(field)
        || matches!(field, "search_text" | "content" | "key" | "entry_type")
        || field.ends_with("_analyzed")
        || field.ends_with("_list")
}

impl Highlighter {
    pub fn new(tag: impl Into<String>) -> Self {
        Highlighter { tag: tag.into(), ..Default::default() }
    }

    /// Case-insensitive alternation of `terms`, longest first
    fn pattern(terms: &[String]) -> Option<Regex> {
        let mut terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if terms.is_empty() {
            return None;
        }
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.dedup();
        let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
        RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
    }

    /// Marked-up text, or `None` when no term occurs
    pub fn highlight_text(&self, text: &str, terms: &[String]) -> Option<String> {
        let pattern = Self::pattern(terms)?;
        self.apply(&pattern, text)
    }

    fn apply(&self, pattern: &Regex, text: &str) -> Option<String> {
        let first = pattern.find(text)?;
        let (start, end) = self.window(text, first.start());

        let mut out = String::with_capacity(text.len() + 16);
        if start > 0 {
            out.push_str("...");
        }
        let slice = &text[start..end];
        let mut last = 0;
        for m in pattern.find_iter(slice) {
            out.push_str(&slice[last..m.start()]);
            out.push_str(&format!("<{}>{}</{}>", self.tag, m.as_str(), self.tag));
            last = m.end();
        }
        out.push_str(&slice[last..]);
        if end < text.len() {
            out.push_str("...");
        }
        Some(out)
    }

    /// Byte window of at most `snippet_length` characters around `hit`
    fn window(&self, text: &str, hit: usize) -> (usize, usize) {
        if text.chars().count() <= self.snippet_length {
            return (0, text.len());
        }
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let hit_char = boundaries.partition_point(|&b| b < hit);
        let total_chars = boundaries.len() - 1;
        let start_char = hit_char
            .saturating_sub(self.snippet_length / 2)
            .min(total_chars.saturating_sub(self.snippet_length));
        let end_char = (start_char + self.snippet_length).min(total_chars);
        (boundaries[start_char], boundaries[end_char])
    }

    /// Highlights per record field of `doc`. `fields` restricts the scan when non-empty.
    pub fn highlight_document(
        &self,
        doc: &Document,
        fields: &[String],
        terms: &[String],
    ) -> Option<BTreeMap<String, Vec<String>>> {
        let pattern = Self::pattern(terms)?;
        let mut highlights = BTreeMap::new();

        for (field, value) in doc.iter() {
            let in_scope = if fields.is_empty() {
                !is_derived_field(field)
            } else {
                fields.iter().any(|f| f == field)
            };
            if !in_scope {
                continue;
            }
            if let Some(marked) = self.apply(&pattern, &value.to_string()) {
                highlights.insert(field.clone(), vec![marked]);
            }
        }

        (!highlights.is_empty()).then_some(highlights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_marks_case_insensitively() {
        let h = Highlighter::default();
        assert_eq!(
            h.highlight_text("Machine Learning for machines", &terms(&["machine"])).unwrap(),
            "<mark>Machine</mark> Learning for <mark>machine</mark>s"
        );
        assert!(h.highlight_text("Graph theory", &terms(&["machine"])).is_none());
    }

    #[test]
    fn test_longest_term_wins() {
        let h = Highlighter::default();
        assert_eq!(
            h.highlight_text("neural networks", &terms(&["net", "networks"])).unwrap(),
            "neural <mark>networks</mark>"
        );
    }

    #[test]
    fn test_long_text_snippet() {
        let h = Highlighter { snippet_length: 20, ..Default::default() };
        let text = format!("{} target {}", "x".repeat(50), "y".repeat(50));
        let marked = h.highlight_text(&text, &terms(&["target"])).unwrap();
        assert!(marked.starts_with("..."));
        assert!(marked.ends_with("..."));
        assert!(marked.contains("<mark>target</mark>"));
    }

    #[test]
    fn test_document_skips_derived_fields() {
        let doc = Document::new()
            .with_field("title", "Deep Learning")
            .with_field("search_text", "Deep Learning")
            .with_field("title_analyzed", "deep learn");
        let h = Highlighter::default();
        let highlights = h.highlight_document(&doc, &[], &terms(&["deep"])).unwrap();
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights["title"], vec!["<mark>Deep</mark> Learning"]);
    }
}
