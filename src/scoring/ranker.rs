use std::collections::BTreeMap;
use crate::core::types::Document;
use crate::scoring::scorer::{
    clamp_score, term_frequency, FieldBoosts, FieldLengthScorer, FieldStats, Scorer,
};
use crate::search::results::Match;

/// Fields a [`Bm25Ranker`] reads, with the average length (in words) each
/// is normalised against
const RANKED_FIELDS: &[(&str, f64)] = &[
    ("title", 10.0),
    ("abstract", 100.0),
    ("keywords", 5.0),
    ("author", 5.0),
    ("journal", 5.0),
    ("booktitle", 10.0),
    ("note", 20.0),
];

/// Collection statistics shared by every match of one query
#[derive(Debug, Clone, Default)]
pub struct RankingContext {
    pub total_docs: usize,
    pub doc_frequencies: BTreeMap<String, usize>,  // Lowercased term -> documents containing it
}

impl RankingContext {
    pub fn doc_frequency(&self, term: &str) -> usize {
        self.doc_frequencies.get(term).copied().unwrap_or(0)
    }
}

/// Re-orders a result window whose matches carry their documents
pub trait Ranker: Send + Sync {
    fn score(&self, doc: &Document, terms: &[String], ctx: &RankingContext) -> f64;

    /// Rescore every match that has a document, then sort by descending
    /// score. Ties keep their incoming order.
    fn rank(&self, matches: &mut [Match], terms: &[String], ctx: &RankingContext) {
        for m in matches.iter_mut() {
            if let Some(doc) = &m.document {
                m.score = clamp_score(self.score(doc, terms, ctx));
            }
        }
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    fn name(&self) -> &str;
}

/// Weights used when a ranker is built without explicit boosts
pub fn default_ranking_weights() -> FieldBoosts {
    let weights = [
        ("title", 2.0),
        ("abstract", 1.0),
        ("keywords", 1.5),
        ("author", 1.2),
        ("journal", 0.8),
        ("booktitle", 0.8),
        ("note", 0.5),
    ]
    .into_iter()
    .map(|(f, w)| (f.to_string(), w))
    .collect();
    FieldBoosts::new(weights, 1.0)
}

/// Okapi BM25 over the descriptive fields of each document. Every field
/// contributes `idf * saturation * weight` per query term.
#[derive(Debug, Clone)]
pub struct Bm25Ranker {
    pub k1: f64,  // Term frequency saturation (default: 1.2)
    pub b: f64,   // Length normalization strength (default: 0.75)
    weights: FieldBoosts,
}

impl Default for Bm25Ranker {
    fn default() -> Self {
        Bm25Ranker::new(default_ranking_weights())
    }
}

impl Bm25Ranker {
    pub fn new(weights: FieldBoosts) -> Self {
        Bm25Ranker { k1: 1.2, b: 0.75, weights }
    }

    /// `ln(1 + (N - df + 0.5) / (df + 0.5))`, never negative
    pub fn idf(&self, doc_freq: usize, total_docs: usize) -> f64 {
        if total_docs == 0 {
            return 0.0;
        }
        let n = total_docs as f64;
        let df = doc_freq.min(total_docs) as f64;
        ((n - df + 0.5) / (df + 0.5)).ln_1p()
    }
}

impl Ranker for Bm25Ranker {
    fn score(&self, doc: &Document, terms: &[String], ctx: &RankingContext) -> f64 {
        let mut total = 0.0;
        for &(field, avg_field_length) in RANKED_FIELDS {
            let Some(value) = doc.get_field(field) else {
                continue;
            };
            let text = value.to_string().to_lowercase();
            let field_length = text.split_whitespace().count();
            let scorer = FieldLengthScorer { k1: self.k1, b: self.b, avg_field_length };
            let weight = self.weights.get(field);

            for term in terms {
                let term_freq = term_frequency(&text, term);
                if term_freq == 0 {
                    continue;
                }
                let saturation =
                    scorer.score(&FieldStats { term_freq, field_length }) * (self.k1 + 1.0);
                total += self.idf(ctx.doc_frequency(term), ctx.total_docs) * saturation * weight;
            }
        }
        total
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(key: &str, score: f64, doc: Document) -> Match {
        Match { key: key.to_string(), score, highlights: None, document: Some(doc) }
    }

    fn context(total_docs: usize, frequencies: &[(&str, usize)]) -> RankingContext {
        RankingContext {
            total_docs,
            doc_frequencies: frequencies.iter().map(|(t, n)| (t.to_string(), *n)).collect(),
        }
    }

    #[test]
    fn test_idf_prefers_rare_terms() {
        let ranker = Bm25Ranker::default();
        assert!(ranker.idf(1, 100) > ranker.idf(50, 100));
        assert!(ranker.idf(100, 100) > 0.0);
        assert_eq!(ranker.idf(3, 0), 0.0);
    }

    #[test]
    fn test_rare_term_outranks_common_term() {
        let ranker = Bm25Ranker::default();
        let terms = vec!["graph".to_string(), "quantum".to_string()];
        let ctx = context(10, &[("graph", 9), ("quantum", 1)]);
        let mut matches = vec![
            hit("common", 50.0, Document::new().with_field("title", "Graph Methods")),
            hit("rare", 10.0, Document::new().with_field("title", "Quantum Methods")),
        ];

        ranker.rank(&mut matches, &terms, &ctx);
        assert_eq!(matches[0].key, "rare");
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn test_field_weight_orders_equal_matches() {
        let ranker = Bm25Ranker::default();
        let terms = vec!["graph".to_string()];
        let ctx = context(10, &[("graph", 2)]);
        let mut matches = vec![
            hit("in_abstract", 50.0, Document::new().with_field("abstract", "graph methods")),
            hit("in_title", 10.0, Document::new().with_field("title", "graph methods")),
        ];

        ranker.rank(&mut matches, &terms, &ctx);
        assert_eq!(matches[0].key, "in_title");
    }

    #[test]
    fn test_matches_without_documents_keep_scores() {
        let ranker = Bm25Ranker::default();
        let mut matches = vec![Match { key: "bare".into(), score: 7.5, highlights: None, document: None }];
        ranker.rank(&mut matches, &["graph".to_string()], &context(1, &[("graph", 1)]));
        assert_eq!(matches[0].score, 7.5);
    }

    #[test]
    fn test_custom_weights() {
        let weights = FieldBoosts::new([("abstract".to_string(), 5.0)].into_iter().collect(), 1.0);
        let ranker = Bm25Ranker::new(weights);
        let terms = vec!["graph".to_string()];
        let ctx = context(10, &[("graph", 2)]);
        let mut matches = vec![
            hit("in_title", 50.0, Document::new().with_field("title", "graph methods")),
            hit("in_abstract", 10.0, Document::new().with_field("abstract", "graph methods")),
        ];

        ranker.rank(&mut matches, &terms, &ctx);
        assert_eq!(matches[0].key, "in_abstract");
    }
}
