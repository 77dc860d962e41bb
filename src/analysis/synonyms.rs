use std::collections::{BTreeMap, HashMap};

const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("ml", "machine learning"),
    ("ai", "artificial intelligence"),
    ("nn", "neural network"),
    ("nlp", "natural language processing"),
    ("cv", "computer vision"),
    ("dl", "deep learning"),
    ("rl", "reinforcement learning"),
    ("gan", "generative adversarial network"),
    ("rnn", "recurrent neural network"),
    ("cnn", "convolutional neural network"),
    ("lstm", "long short term memory"),
    ("bert", "bidirectional encoder representations from transformers"),
    ("gpt", "generative pretrained transformer"),
    ("db", "database"),
    ("hci", "human computer interaction"),
    ("os", "operating systems"),
    ("algo", "algorithms"),
    ("ds", "data structures"),
    ("se", "software engineering"),
];

/// Longest multi-word span tried by [`SynonymExpander::expand`]
const MAX_PHRASE_WORDS: usize = 5;

/// Bidirectional abbreviation and phrase map
#[derive(Debug, Clone)]
pub struct SynonymExpander {
    synonyms: BTreeMap<String, Vec<String>>,
    reverse: HashMap<String, String>,
}

impl SynonymExpander {
    pub fn new() -> Self {
        let mut expander = SynonymExpander {
            synonyms: BTreeMap::new(),
            reverse: HashMap::new(),
        };
        for (abbrev, expansion) in DEFAULT_SYNONYMS {
            expander.add_synonyms(abbrev, vec![expansion.to_string()]);
        }
        expander
    }

    /// Defaults plus `custom`, custom entries replacing defaults
    pub fn with_custom(custom: &HashMap<String, Vec<String>>) -> Self {
        let mut expander = SynonymExpander::new();
        let mut entries: Vec<_> = custom.iter().collect();
        entries.sort();
        for (term, synonyms) in entries {
            expander.add_synonyms(term, synonyms.clone());
        }
        expander
    }

    pub fn add_synonyms(&mut self, term: &str, synonyms: Vec<String>) {
        let term = term.to_lowercase();
        let synonyms: Vec<String> = synonyms.into_iter().map(|s| s.to_lowercase()).collect();

        if let Some(previous) = self.synonyms.remove(&term) {
            for expansion in previous {
                if self.reverse.get(&expansion) == Some(&term) {
                    self.reverse.remove(&expansion);
                }
            }
        }
        for expansion in &synonyms {
            self.reverse.insert(expansion.clone(), term.clone());
        }
        self.synonyms.insert(term, synonyms);
    }

    /// Expansions registered for `term` as an abbreviation
    pub fn forward(&self, term: &str) -> Option<&[String]> {
        self.synonyms.get(&term.to_lowercase()).map(Vec::as_slice)
    }

    /// Synonyms in both directions
    pub fn get_synonyms(&self, term: &str) -> Vec<String> {
        let lower = term.to_lowercase();
        let mut result = Vec::new();
        if let Some(expansions) = self.synonyms.get(&lower) {
            result.extend(expansions.iter().cloned());
        }
        if let Some(abbrev) = self.reverse.get(&lower) {
            result.push(abbrev.clone());
        }
        result
    }

    /// Rewrite text with `(term OR synonym)` groups, longest phrase first
    pub fn expand(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let mut parts = Vec::new();
        let mut i = 0;

        while i < words.len() {
            let longest = MAX_PHRASE_WORDS.min(words.len() - i);
            let found = (1..=longest).rev().find_map(|len| {
                let phrase = words[i..i + len].join(" ");
                if let Some(expansions) = self.synonyms.get(&phrase) {
                    let mut alternatives = vec![phrase.clone()];
                    alternatives.extend(expansions.iter().cloned());
                    Some((len, format!("({})", alternatives.join(" OR "))))
                } else {
                    self.reverse.get(&phrase)
                        .map(|abbrev| (len, format!("({} OR {})", phrase, abbrev)))
                }
            });

            match found {
                Some((len, group)) => {
                    parts.push(group);
                    i += len;
                }
                None => {
                    parts.push(words[i].to_string());
                    i += 1;
                }
            }
        }

        parts.join(" ")
    }
}

impl Default for SynonymExpander {
    fn default() -> Self {
        Self::new()
    }
}
