use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use serde::{Deserialize, Serialize};
use crate::core::types::{DocId, Document};
use crate::query::expander::SuggestionKind;

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub key: String,
    pub score: f64, // Always within [0, 100]
    pub highlights: Option<BTreeMap<String, Vec<String>>>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub suggestion: String,
    pub kind: SuggestionKind,
    pub confidence: f64,
    pub description: String,
}

/// Search results container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub matches: Vec<Match>,
    pub total: usize,  // Matches before pagination
    pub offset: usize,
    pub limit: usize,
    pub facets: Option<BTreeMap<String, Vec<FacetValue>>>,
    pub suggestions: Vec<SearchSuggestion>,
    pub took_ms: u64,
}

impl ResultSet {
    pub fn empty(offset: usize, limit: usize) -> Self {
        ResultSet {
            matches: Vec::new(),
            total: 0,
            offset,
            limit,
            facets: None,
            suggestions: Vec::new(),
            took_ms: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.key.as_str()).collect()
    }

    pub fn has_more(&self) -> bool {
        self.offset + self.matches.len() < self.total
    }

    pub fn max_score(&self) -> f64 {
        self.matches.iter().map(|m| m.score).fold(0.0, f64::max)
    }
}

/// Candidate during collection. Orders best-first: higher score, then key.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub key: String,
    pub score: f64,
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Top-K collector. The heap top is the weakest kept candidate.
pub struct TopKCollector {
    heap: BinaryHeap<ScoredDocument>,
    k: usize,
    total_collected: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, scored_doc: ScoredDocument) {
        self.total_collected += 1;
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(scored_doc);
        } else if let Some(weakest) = self.heap.peek()
            && scored_doc < *weakest
        {
            self.heap.pop();
            self.heap.push(scored_doc);
        }
    }

    pub fn total_collected(&self) -> usize {
        self.total_collected
    }

    /// Kept candidates, best first
    pub fn into_sorted(self) -> Vec<ScoredDocument> {
        self.heap.into_sorted_vec()
    }
}
