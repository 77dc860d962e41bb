use fst::Automaton;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA, SINK_STATE};

/// Largest edit distance a fuzzy query may request
pub const MAX_EDIT_DISTANCE: u8 = 2;

/// Levenshtein automaton for one fuzzy term.
///
/// Transpositions count as a single edit. The first `prefix_length`
/// characters of a candidate must match the term exactly.
pub struct FuzzyAutomaton {
    term: String,
    max_edits: u8,
    prefix_length: usize,
    dfa: DFA,
}

impl FuzzyAutomaton {
    pub fn new(term: &str, max_edits: u8, prefix_length: usize) -> Self {
        let max_edits = max_edits.min(MAX_EDIT_DISTANCE);
        let term = term.to_lowercase();
        let dfa = LevenshteinAutomatonBuilder::new(max_edits, true).build_dfa(&term);
        FuzzyAutomaton {
            term,
            max_edits,
            prefix_length,
            dfa,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn max_edits(&self) -> u8 {
        self.max_edits
    }

    /// Required literal prefix
    pub fn prefix(&self) -> &str {
        match self.term.char_indices().nth(self.prefix_length) {
            Some((idx, _)) => &self.term[..idx],
            None => &self.term,
        }
    }

    /// Edit distance to `candidate` when within bounds
    pub fn distance(&self, candidate: &str) -> Option<u8> {
        if !candidate.starts_with(self.prefix()) {
            return None;
        }
        match self.dfa.eval(candidate) {
            Distance::Exact(d) if d <= self.max_edits => Some(d),
            _ => None,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.distance(candidate).is_some()
    }

    /// Adapter for walking an `fst` set or map
    pub fn automaton(&self) -> DfaAutomaton<'_> {
        DfaAutomaton(&self.dfa)
    }
}

/// `fst::Automaton` view over a Levenshtein DFA
pub struct DfaAutomaton<'a>(&'a DFA);

impl Automaton for DfaAutomaton<'_> {
    type State = u32;

    fn start(&self) -> u32 {
        self.0.initial_state()
    }

    fn is_match(&self, state: &u32) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &u32) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &u32, byte: u8) -> u32 {
        self.0.transition(*state, byte)
    }
}
