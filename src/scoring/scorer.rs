use std::collections::BTreeMap;
use crate::core::config::{default_field_boosts, Config};

/// Upper bound for any reported match score
pub const MAX_SCORE: f64 = 100.0;

/// Scorer trait
pub trait Scorer: Send + Sync {
    fn score(&self, stats: &FieldStats) -> f64;

    fn name(&self) -> &str;
}

/// Term statistics within one field of one document
#[derive(Debug, Clone, Copy)]
pub struct FieldStats {
    pub term_freq: usize,     // Occurrences of the term in the field text
    pub field_length: usize,  // Whitespace-separated words in the field
}

/// BM25-style saturation with field-length normalisation against a fixed
/// average field length. There is no IDF component.
#[derive(Debug, Clone)]
pub struct FieldLengthScorer {
    pub k1: f64,  // Term frequency saturation (default: 1.2)
    pub b: f64,   // Length normalization strength (default: 0.75)
    pub avg_field_length: f64,
}

impl Default for FieldLengthScorer {
    fn default() -> Self {
        FieldLengthScorer {
            k1: 1.2,
            b: 0.75,
            avg_field_length: 100.0,
        }
    }
}

impl Scorer for FieldLengthScorer {
    fn score(&self, stats: &FieldStats) -> f64 {
        if stats.term_freq == 0 {
            return 0.0;
        }
        let tf = stats.term_freq as f64;
        let norm = 1.0 - self.b + self.b * (stats.field_length as f64 / self.avg_field_length);
        tf / (tf + self.k1 * norm)
    }

    fn name(&self) -> &str {
        "field_length"
    }
}

/// Per-field multipliers applied to clause scores
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoosts {
    boosts: BTreeMap<String, f64>,
    default_boost: f64,
}

impl FieldBoosts {
    pub fn new(boosts: BTreeMap<String, f64>, default_boost: f64) -> Self {
        FieldBoosts { boosts, default_boost }
    }

    pub fn from_config(config: &Config) -> Self {
        FieldBoosts::new(config.field_boosts.clone(), config.default_field_boost)
    }

    pub fn get(&self, field: &str) -> f64 {
        self.boosts.get(field).copied().unwrap_or(self.default_boost)
    }
}

impl Default for FieldBoosts {
    fn default() -> Self {
        FieldBoosts::new(default_field_boosts(), 0.8)
    }
}

/// Non-overlapping occurrences of `term` in `text`. Both are expected lowercased.
pub fn term_frequency(text: &str, term: &str) -> usize {
    if term.is_empty() {
        0
    } else {
        text.matches(term).count()
    }
}

/// Score for a value inside a range. Values near the midpoint of a bounded
/// range score up to 1.5; unbounded ranges score a flat 1.0.
pub fn range_score(value: f64, start: Option<f64>, end: Option<f64>) -> f64 {
    match (start, end) {
        (Some(s), Some(e)) if e > s => {
            let position = 2.0 * (value - s) / (e - s) - 1.0;
            1.0 + 0.5 * (1.0 - position.abs()).max(0.0)
        }
        _ => 1.0,
    }
}

/// Clamp into `[0, MAX_SCORE]`, mapping NaN to zero
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_length_scorer() {
        let scorer = FieldLengthScorer::default();
        let short = scorer.score(&FieldStats { term_freq: 1, field_length: 3 });
        let long = scorer.score(&FieldStats { term_freq: 1, field_length: 300 });
        assert!(short > long);
        // 1 / (1 + 1.2 * (0.25 + 0.75 * 0.03))
        assert!((short - 1.0 / (1.0 + 1.2 * 0.2725)).abs() < 1e-12);
        assert_eq!(scorer.score(&FieldStats { term_freq: 0, field_length: 3 }), 0.0);
    }

    #[test]
    fn test_field_boosts() {
        let boosts = FieldBoosts::default();
        assert_eq!(boosts.get("title"), 2.0);
        assert_eq!(boosts.get("note"), 0.5);
        assert_eq!(boosts.get("publisher"), 0.8);
    }

    #[test]
    fn test_term_frequency_counts_substrings() {
        assert_eq!(term_frequency("learning to learn", "learn"), 2);
        assert_eq!(term_frequency("anything", ""), 0);
    }

    #[test]
    fn test_range_score_midpoint_bonus() {
        assert_eq!(range_score(2022.0, Some(2020.0), Some(2024.0)), 1.5);
        assert_eq!(range_score(2020.0, Some(2020.0), Some(2024.0)), 1.0);
        assert_eq!(range_score(2020.0, None, Some(2024.0)), 1.0);
        assert_eq!(range_score(5.0, Some(5.0), Some(5.0)), 1.0);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(250.0), 100.0);
        assert_eq!(clamp_score(-1.0), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
    }
}
