use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::analysis::spelling::SpellChecker;
use crate::analysis::synonyms::SynonymExpander;
use crate::core::error::Result;
use crate::query::ast::{
    BooleanOperator, BooleanQuery, FieldQuery, PhraseQuery, QueryNode, TermQuery,
};

const CORRECTION_WEIGHT: f64 = 0.8;
const SYNONYM_WEIGHT: f64 = 0.7;
const RELAXED_FUZZY_WEIGHT: f64 = 0.8;
const RELAXED_WILDCARD_WEIGHT: f64 = 0.6;
const MAX_SYNONYMS_SUGGESTED: usize = 2;

const DEFAULT_FIELD_EXPANSIONS: &[(&str, &[(&str, f64)])] = &[
    ("title", &[("title", 1.0), ("abstract", 0.5)]),
    ("author", &[("author", 1.0), ("editor", 0.7)]),
    ("venue", &[("journal", 1.0), ("booktitle", 0.9), ("publisher", 0.6)]),
    ("content", &[("title", 1.0), ("abstract", 0.8), ("keywords", 0.6), ("note", 0.4)]),
];

/// Which rewrites [`QueryExpander::expand`] applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionOptions {
    pub correct_spelling: bool,
    pub expand_synonyms: bool,
    pub expand_fields: bool,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        ExpansionOptions {
            correct_spelling: true,
            expand_synonyms: true,
            expand_fields: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Spelling,
    Synonym,
    Expansion,
    Relaxation,
    FieldExpansion,
    Error,
}

impl SuggestionKind {
    pub fn confidence(&self) -> f64 {
        match self {
            SuggestionKind::Spelling => 0.8,
            SuggestionKind::Synonym => 0.7,
            SuggestionKind::Relaxation => 0.7,
            SuggestionKind::Expansion => 0.6,
            SuggestionKind::FieldExpansion => 0.6,
            SuggestionKind::Error => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySuggestion {
    pub original: String,
    pub suggested: String,
    pub kind: SuggestionKind,
    pub confidence: f64,
    pub explanation: String,
}

impl QuerySuggestion {
    fn new(original: &str, suggested: String, kind: SuggestionKind, explanation: String) -> Self {
        QuerySuggestion {
            original: original.to_string(),
            suggested,
            kind,
            confidence: kind.confidence(),
            explanation,
        }
    }
}

/// Rewrites parsed queries for better recall: spelling alternatives,
/// synonyms, related fields and progressive relaxation.
pub struct QueryExpander {
    spell_checker: SpellChecker,
    synonyms: SynonymExpander,
    field_expansions: BTreeMap<String, Vec<(String, f64)>>,
}

impl QueryExpander {
    pub fn new() -> Result<Self> {
        Ok(Self::with_components(SpellChecker::new()?, SynonymExpander::new()))
    }

    pub fn with_components(spell_checker: SpellChecker, synonyms: SynonymExpander) -> Self {
        let field_expansions = DEFAULT_FIELD_EXPANSIONS
            .iter()
            .map(|(alias, fields)| {
                let fields = fields.iter().map(|(f, w)| (f.to_string(), *w)).collect();
                (alias.to_string(), fields)
            })
            .collect();

        QueryExpander { spell_checker, synonyms, field_expansions }
    }

    pub fn spell_checker(&self) -> &SpellChecker {
        &self.spell_checker
    }

    pub fn synonyms(&self) -> &SynonymExpander {
        &self.synonyms
    }

    /// Apply spelling, then synonyms, then field fan-out
    pub fn expand(&self, node: &QueryNode, options: ExpansionOptions) -> QueryNode {
        let mut expanded = node.clone();
        if options.correct_spelling {
            expanded = self.correct_spelling(expanded);
        }
        if options.expand_synonyms {
            expanded = self.expand_synonyms(expanded);
        }
        if options.expand_fields {
            expanded = self.expand_fields(expanded);
        }
        expanded
    }

    fn correct_spelling(&self, node: QueryNode) -> QueryNode {
        match node {
            QueryNode::Term(q) => match self.corrected_text(&q.text) {
                Some(corrected) => {
                    let alternative = QueryNode::Term(TermQuery {
                        text: corrected,
                        boost: q.boost * CORRECTION_WEIGHT,
                    });
                    QueryNode::or(vec![QueryNode::Term(q), alternative])
                }
                None => QueryNode::Term(q),
            },
            QueryNode::Phrase(q) => match self.corrected_text(&q.text) {
                Some(corrected) => {
                    let alternative = QueryNode::Phrase(PhraseQuery {
                        text: corrected,
                        slop: q.slop,
                        boost: q.boost * CORRECTION_WEIGHT,
                    });
                    QueryNode::or(vec![QueryNode::Phrase(q), alternative])
                }
                None => QueryNode::Phrase(q),
            },
            other => self.rewrite_children(other, |node| self.correct_spelling(node)),
        }
    }

    /// Text with every misspelled word replaced, or `None` when nothing changed
    fn corrected_text(&self, text: &str) -> Option<String> {
        let mut changed = false;
        let words: Vec<String> = text
            .split_whitespace()
            .map(|word| match self.spell_checker.suggest(word, 1).into_iter().next() {
                Some(correction) => {
                    changed = true;
                    correction
                }
                None => word.to_string(),
            })
            .collect();
        changed.then(|| words.join(" "))
    }

    fn expand_synonyms(&self, node: QueryNode) -> QueryNode {
        match node {
            QueryNode::Term(q) => {
                let synonyms = self.synonyms.get_synonyms(q.text.trim());
                if synonyms.is_empty() {
                    return QueryNode::Term(q);
                }
                let boost = q.boost * SYNONYM_WEIGHT;
                let mut alternatives = vec![QueryNode::Term(q)];
                alternatives.extend(synonyms.into_iter().map(|s| synonym_leaf(s, 0, boost)));
                QueryNode::or(alternatives)
            }
            QueryNode::Phrase(q) => {
                let synonyms = self.synonyms.get_synonyms(q.text.trim());
                if synonyms.is_empty() {
                    return QueryNode::Phrase(q);
                }
                let boost = q.boost * SYNONYM_WEIGHT;
                let slop = q.slop;
                let mut alternatives = vec![QueryNode::Phrase(q)];
                alternatives.extend(synonyms.into_iter().map(|s| synonym_leaf(s, slop, boost)));
                QueryNode::or(alternatives)
            }
            other => self.rewrite_children(other, |node| self.expand_synonyms(node)),
        }
    }

    fn expand_fields(&self, node: QueryNode) -> QueryNode {
        match node {
            QueryNode::Field(q) => {
                let alias = q.field.to_lowercase();
                match self.field_expansions.get(&alias) {
                    Some(targets) if targets.len() > 1 => QueryNode::or(
                        targets
                            .iter()
                            .map(|(field, weight)| {
                                QueryNode::field(field.clone(), q.query.as_ref().clone().scale_boost(*weight))
                            })
                            .collect(),
                    ),
                    _ => QueryNode::Field(FieldQuery {
                        field: q.field,
                        query: Box::new(self.expand_fields(*q.query)),
                    }),
                }
            }
            QueryNode::Boolean(q) => QueryNode::Boolean(BooleanQuery {
                operator: q.operator,
                children: q.children.into_iter().map(|c| self.expand_fields(c)).collect(),
            }),
            other => other,
        }
    }

    fn rewrite_children(&self, node: QueryNode, f: impl Fn(QueryNode) -> QueryNode) -> QueryNode {
        match node {
            QueryNode::Field(q) => QueryNode::Field(FieldQuery {
                field: q.field,
                query: Box::new(f(*q.query)),
            }),
            QueryNode::Boolean(q) => QueryNode::Boolean(BooleanQuery {
                operator: q.operator,
                children: q.children.into_iter().map(f).collect(),
            }),
            other => other,
        }
    }

    /// Spelling, synonym and field-expansion hints, best first
    pub fn suggest_corrections(&self, node: &QueryNode, max: usize) -> Vec<QuerySuggestion> {
        let query = node.to_string();
        let mut suggestions = Vec::new();

        for word in leaf_words(node) {
            if let Some(correction) = self.spell_checker.suggest(&word, 1).into_iter().next() {
                suggestions.push(QuerySuggestion::new(
                    &query,
                    query.replace(&word, &correction),
                    SuggestionKind::Spelling,
                    format!("Did you mean '{}' instead of '{}'?", correction, word),
                ));
            }
        }

        for text in leaf_texts(node) {
            let synonyms: Vec<String> = self
                .synonyms
                .get_synonyms(&text)
                .into_iter()
                .take(MAX_SYNONYMS_SUGGESTED)
                .collect();
            if synonyms.is_empty() {
                continue;
            }
            suggestions.push(QuerySuggestion::new(
                &query,
                query.replace(&text, &format!("({} OR {})", text, synonyms.join(" OR "))),
                SuggestionKind::Synonym,
                format!("Include related terms: {}", synonyms.join(", ")),
            ));
        }

        if let QueryNode::Field(q) = node
            && let Some(targets) = self.field_expansions.get(&q.field.to_lowercase())
            && targets.len() > 1
        {
            let alias = q.field.to_lowercase();
            let others: Vec<&str> = targets
                .iter()
                .map(|(f, _)| f.as_str())
                .filter(|f| *f != alias)
                .collect();
            if !others.is_empty() {
                let alternatives: Vec<String> =
                    others.iter().map(|f| format!("{}:{}", f, q.query)).collect();
                suggestions.push(QuerySuggestion::new(
                    &query,
                    format!("({} OR {})", query, alternatives.join(" OR ")),
                    SuggestionKind::Expansion,
                    format!("Also search in: {}", others.join(", ")),
                ));
            }
        }

        suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        suggestions.truncate(max);
        suggestions
    }

    /// Broaden a query. Level 1 turns every AND into OR, level 2 also adds
    /// one-edit fuzzy alternatives, level 3 also adds prefix wildcards.
    /// Negated branches are left as they are so the match set only grows.
    pub fn relax(&self, node: &QueryNode, level: u8) -> QueryNode {
        let mut relaxed = node.clone();
        if level >= 1 {
            relaxed = relax_operators(relaxed);
        }
        if level >= 2 {
            relaxed = add_alternatives(relaxed, &|term: &TermQuery| {
                (term.text.chars().count() >= 4).then(|| {
                    QueryNode::fuzzy(term.text.clone(), 1).with_boost(term.boost * RELAXED_FUZZY_WEIGHT)
                })
            });
        }
        if level >= 3 {
            relaxed = add_alternatives(relaxed, &|term: &TermQuery| {
                (term.text.chars().count() >= 3).then(|| {
                    QueryNode::wildcard(format!("{}*", term.text))
                        .with_boost(term.boost * RELAXED_WILDCARD_WEIGHT)
                })
            });
        }
        relaxed
    }

    /// Replace the synonyms registered for `term`
    pub fn add_synonym_mapping(&mut self, term: &str, synonyms: Vec<String>) {
        self.synonyms.add_synonyms(term, synonyms);
    }

    /// Fan `alias` out to `fields`. Without explicit weights the fields get
    /// 1.0, 0.8, 0.6, ... in order.
    pub fn add_field_expansion(&mut self, alias: &str, fields: &[&str], weights: Option<&[f64]>) {
        let targets = fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let weight = weights
                    .and_then(|w| w.get(i).copied())
                    .unwrap_or_else(|| (1.0 - 0.2 * i as f64).max(0.2));
                (field.to_string(), weight)
            })
            .collect();
        self.field_expansions.insert(alias.to_lowercase(), targets);
    }
}

fn synonym_leaf(text: String, slop: u32, boost: f64) -> QueryNode {
    if text.split_whitespace().count() > 1 {
        QueryNode::Phrase(PhraseQuery { text, slop, boost })
    } else {
        QueryNode::Term(TermQuery { text, boost })
    }
}

fn relax_operators(node: QueryNode) -> QueryNode {
    match node {
        QueryNode::Boolean(q) => match q.operator {
            BooleanOperator::And | BooleanOperator::Or => QueryNode::or(
                q.children.into_iter().map(relax_operators).collect(),
            ),
            BooleanOperator::Not => QueryNode::Boolean(map_positive_branch(q, relax_operators)),
        },
        QueryNode::Field(q) => QueryNode::Field(FieldQuery {
            field: q.field,
            query: Box::new(relax_operators(*q.query)),
        }),
        other => other,
    }
}

fn add_alternatives(node: QueryNode, make: &dyn Fn(&TermQuery) -> Option<QueryNode>) -> QueryNode {
    match node {
        QueryNode::Term(q) => match make(&q) {
            Some(alternative) => QueryNode::or(vec![QueryNode::Term(q), alternative]),
            None => QueryNode::Term(q),
        },
        QueryNode::Field(q) => QueryNode::Field(FieldQuery {
            field: q.field,
            query: Box::new(add_alternatives(*q.query, make)),
        }),
        QueryNode::Boolean(q) if q.operator == BooleanOperator::Not => {
            QueryNode::Boolean(map_positive_branch(q, |c| add_alternatives(c, make)))
        }
        QueryNode::Boolean(q) => QueryNode::Boolean(BooleanQuery {
            operator: q.operator,
            children: q.children.into_iter().map(|c| add_alternatives(c, make)).collect(),
        }),
        other => other,
    }
}

/// Rewrite only the left operand of a binary NOT; unary NOT stays as is
fn map_positive_branch(q: BooleanQuery, f: impl Fn(QueryNode) -> QueryNode) -> BooleanQuery {
    if q.children.len() != 2 {
        return q;
    }
    let mut children = q.children.into_iter();
    let mut rewritten = Vec::with_capacity(2);
    if let Some(left) = children.next() {
        rewritten.push(f(left));
    }
    rewritten.extend(children);
    BooleanQuery { operator: q.operator, children: rewritten }
}

/// Individual words of term and phrase leaves
fn leaf_words(node: &QueryNode) -> Vec<String> {
    leaf_texts(node)
        .iter()
        .flat_map(|t| t.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Whole texts of term and phrase leaves
fn leaf_texts(node: &QueryNode) -> Vec<String> {
    match node {
        QueryNode::Term(q) => vec![q.text.clone()],
        QueryNode::Phrase(q) => vec![q.text.clone()],
        QueryNode::Field(q) => leaf_texts(&q.query),
        QueryNode::Boolean(q) => q.children.iter().flat_map(leaf_texts).collect(),
        _ => Vec::new(),
    }
}
