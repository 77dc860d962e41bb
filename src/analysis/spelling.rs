use std::collections::BTreeSet;
use fst::{IntoStreamer, Set, Streamer};
use crate::core::error::Result;
use crate::search::fuzzy::FuzzyAutomaton;

/// Words shorter than this are never corrected
const MIN_CORRECTABLE_LEN: usize = 4;

/// General academic vocabulary the checker knows out of the box
const BASE_VOCABULARY: &[&str] = &[
    "abstract", "academic", "accuracy", "adaptive", "adversarial", "agent", "agents",
    "algorithm", "algorithms", "analysis", "analytics", "application", "applications",
    "approach", "approaches", "architecture", "architectures", "artificial", "attention",
    "automated", "automatic", "bayesian", "benchmark", "benchmarks", "bidirectional",
    "biology", "classification", "clustering", "cognitive", "communication", "compiler",
    "compilers", "complexity", "computation", "computational", "computer", "computers",
    "computing", "concurrency", "concurrent", "conference", "convolutional", "corpus",
    "cryptography", "data", "database", "databases", "decision", "deep", "design",
    "detection", "development", "discovery", "distributed", "dynamic", "dynamics",
    "education", "efficient", "embedding", "embeddings", "empirical", "encoder",
    "engineering", "estimation", "evaluation", "evolutionary", "experiment", "experimental",
    "experiments", "extraction", "framework", "frameworks", "function", "functional",
    "functions", "fundamental", "fundamentals", "generation", "generative", "genetic",
    "graph", "graphics", "graphs", "hardware", "human", "image", "images", "implementation",
    "inference", "information", "intelligence", "interaction", "interface", "international",
    "introduction", "journal", "knowledge", "language", "languages", "large", "learning",
    "linear", "logic", "machine", "machines", "management", "mathematical", "mathematics",
    "matrix", "memory", "method", "methods", "mining", "mobile", "model", "modeling",
    "models", "modelling", "multiple", "natural", "network", "networks", "neural",
    "noise", "nonlinear", "numerical", "object", "operating", "optimal", "optimization",
    "parallel", "parsing", "pattern", "patterns", "performance", "physics", "prediction",
    "pretrained", "principles", "privacy", "probabilistic", "probability", "problem",
    "problems", "proceedings", "processing", "program", "programming", "programs",
    "proof", "protocol", "protocols", "quantum", "query", "queries", "random", "reasoning",
    "recognition", "recurrent", "reinforcement", "representation", "representations",
    "research", "retrieval", "review", "robotics", "robust", "scalable", "scheduling",
    "science", "search", "security", "semantic", "semantics", "sensor", "sequence",
    "signal", "simulation", "social", "software", "speech", "statistical", "statistics",
    "storage", "structure", "structures", "study", "survey", "symposium", "synthesis",
    "system", "systems", "technology", "theoretical", "theory", "training", "transactions",
    "transfer", "transformer", "transformers", "translation", "tree", "trees", "university",
    "unsupervised", "supervised", "verification", "vision", "visual", "visualization",
    "wireless", "with", "workshop",
];

/// Domain terms missing from general dictionaries
const DOMAIN_VOCABULARY: &[&str] = &[
    "bibtex", "latex", "doi", "isbn", "issn", "arxiv", "acm", "ieee", "dataset",
    "datasets", "metadata", "workflow", "workflows", "blockchain", "cryptocurrency",
    "backend", "frontend", "middleware", "microservice", "microservices", "api", "apis",
    "json", "xml", "sql", "nosql", "mongodb", "postgresql", "redis", "elasticsearch",
    "kubernetes", "docker", "containerization", "virtualization", "github", "gitlab",
    "bitbucket", "versioning", "refactoring", "unittest", "pytest", "debugging",
    "profiling", "benchmarking",
];

/// Dictionary-backed spell checker over an `fst` word set
pub struct SpellChecker {
    words: BTreeSet<String>,
    dictionary: Set<Vec<u8>>,
}

impl SpellChecker {
    pub fn new() -> Result<Self> {
        Self::with_words(std::iter::empty::<&str>())
    }

    /// Default vocabulary plus `custom` words
    pub fn with_words<I, S>(custom: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = BASE_VOCABULARY.iter()
            .chain(DOMAIN_VOCABULARY.iter())
            .map(|w| w.to_string())
            .chain(custom.into_iter().map(|w| w.as_ref().trim().to_lowercase()))
            .filter(|w| !w.is_empty())
            .collect();

        Ok(SpellChecker {
            dictionary: Set::from_iter(words.iter())?,
            words,
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Known words, numbers and very short tokens all count as correct
    pub fn check(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        lower.chars().count() < MIN_CORRECTABLE_LEN
            || lower.chars().any(|c| c.is_ascii_digit())
            || self.dictionary.contains(&lower)
    }

    /// Ranked corrections for a misspelled word; empty when the word is known
    pub fn suggest(&self, word: &str, max: usize) -> Vec<String> {
        if max == 0 || self.check(word) {
            return Vec::new();
        }

        let lower = word.to_lowercase();
        let len = lower.chars().count();
        let max_edits = if len <= 5 { 1 } else { 2 };
        let automaton = FuzzyAutomaton::new(&lower, max_edits, 0);

        let mut candidates: Vec<(u8, usize, String)> = Vec::new();
        let mut stream = self.dictionary.search(automaton.automaton()).into_stream();
        while let Some(key) = stream.next() {
            let Ok(candidate) = std::str::from_utf8(key) else { continue };
            if let Some(distance) = automaton.distance(candidate) {
                let len_diff = candidate.chars().count().abs_diff(len);
                candidates.push((distance, len_diff, candidate.to_string()));
            }
        }

        candidates.sort();
        candidates.into_iter().take(max).map(|(_, _, w)| w).collect()
    }

    pub fn add_word(&mut self, word: &str) -> Result<()> {
        self.add_words([word])
    }

    pub fn add_words<I, S>(&mut self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.words.len();
        self.words.extend(
            words.into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        if self.words.len() != before {
            self.dictionary = Set::from_iter(self.words.iter())?;
        }
        Ok(())
    }

    /// Correct each whitespace-separated word, leaving `field:value` tokens alone.
    /// Returns the corrected text and `"word -> correction"` notes.
    pub fn correct_query(&self, query: &str) -> (String, Vec<String>) {
        let mut corrected = Vec::new();
        let mut corrections = Vec::new();

        for word in query.split_whitespace() {
            if word.contains(':') {
                corrected.push(word.to_string());
                continue;
            }
            match self.suggest(word, 1).into_iter().next() {
                Some(suggestion) => {
                    corrections.push(format!("{} -> {}", word, suggestion));
                    corrected.push(suggestion);
                }
                None => corrected.push(word.to_string()),
            }
        }

        (corrected.join(" "), corrections)
    }
}
