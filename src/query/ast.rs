use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed query tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    Term(TermQuery),
    Phrase(PhraseQuery),
    Field(FieldQuery),
    Boolean(BooleanQuery),
    Wildcard(WildcardQuery),
    Fuzzy(FuzzyQuery),
    Range(RangeQuery),
}

/// Single term, matched token by token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub text: String,
    pub boost: f64,
}

/// Exact phrase match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseQuery {
    pub text: String,
    pub slop: u32, // Max gap between consecutive phrase words
    pub boost: f64,
}

/// Restricts the inner query to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldQuery {
    pub field: String,
    pub query: Box<QueryNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOperator {
    And,
    Or,
    Not,
}

/// AND/OR take two or more children. NOT takes one (negation of
/// everything) or two (left minus right).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
    pub operator: BooleanOperator,
    pub children: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardQuery {
    pub pattern: String, // `*` any run, `?` one character
    pub boost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyQuery {
    pub term: String,
    pub max_edits: u8,
    pub prefix_length: u32,
    pub boost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeValue {
    Number(f64),
    Text(String),
}

/// Range over a numeric or date field. `None` bounds are open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,
    pub start: Option<RangeValue>,
    pub end: Option<RangeValue>,
    pub include_start: bool,
    pub include_end: bool,
    pub boost: f64,
}

pub const DEFAULT_FUZZY_EDITS: u8 = 2;

impl QueryNode {
    pub fn term(text: impl Into<String>) -> Self {
        QueryNode::Term(TermQuery { text: text.into(), boost: 1.0 })
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        QueryNode::Phrase(PhraseQuery { text: text.into(), slop: 0, boost: 1.0 })
    }

    pub fn field(field: impl Into<String>, query: QueryNode) -> Self {
        QueryNode::Field(FieldQuery { field: field.into(), query: Box::new(query) })
    }

    pub fn and(children: Vec<QueryNode>) -> Self {
        QueryNode::Boolean(BooleanQuery { operator: BooleanOperator::And, children })
    }

    pub fn or(children: Vec<QueryNode>) -> Self {
        QueryNode::Boolean(BooleanQuery { operator: BooleanOperator::Or, children })
    }

    pub fn not(children: Vec<QueryNode>) -> Self {
        QueryNode::Boolean(BooleanQuery { operator: BooleanOperator::Not, children })
    }

    pub fn wildcard(pattern: impl Into<String>) -> Self {
        QueryNode::Wildcard(WildcardQuery { pattern: pattern.into(), boost: 1.0 })
    }

    pub fn fuzzy(term: impl Into<String>, max_edits: u8) -> Self {
        QueryNode::Fuzzy(FuzzyQuery {
            term: term.into(),
            max_edits,
            prefix_length: 0,
            boost: 1.0,
        })
    }

    /// Boost of a leaf node. Field and boolean nodes carry none.
    pub fn boost(&self) -> Option<f64> {
        match self {
            QueryNode::Term(q) => Some(q.boost),
            QueryNode::Phrase(q) => Some(q.boost),
            QueryNode::Wildcard(q) => Some(q.boost),
            QueryNode::Fuzzy(q) => Some(q.boost),
            QueryNode::Range(q) => Some(q.boost),
            QueryNode::Field(_) | QueryNode::Boolean(_) => None,
        }
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.set_boost(boost);
        self
    }

    fn set_boost(&mut self, boost: f64) {
        match self {
            QueryNode::Term(q) => q.boost = boost,
            QueryNode::Phrase(q) => q.boost = boost,
            QueryNode::Wildcard(q) => q.boost = boost,
            QueryNode::Fuzzy(q) => q.boost = boost,
            QueryNode::Range(q) => q.boost = boost,
            QueryNode::Field(_) | QueryNode::Boolean(_) => {}
        }
    }

    /// Multiply the boost of every leaf by `factor`
    pub fn scale_boost(mut self, factor: f64) -> Self {
        self.visit_leaves_mut(&mut |leaf| {
            if let Some(boost) = leaf.boost() {
                leaf.set_boost(boost * factor);
            }
        });
        self
    }

    fn visit_leaves_mut(&mut self, f: &mut dyn FnMut(&mut QueryNode)) {
        match self {
            QueryNode::Field(q) => q.query.visit_leaves_mut(f),
            QueryNode::Boolean(q) => {
                for child in &mut q.children {
                    child.visit_leaves_mut(f);
                }
            }
            leaf => f(leaf),
        }
    }

    pub fn is_boolean(&self, operator: BooleanOperator) -> bool {
        matches!(self, QueryNode::Boolean(q) if q.operator == operator)
    }
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOperator::And => write!(f, "AND"),
            BooleanOperator::Or => write!(f, "OR"),
            BooleanOperator::Not => write!(f, "NOT"),
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            RangeValue::Number(n) => write!(f, "{}", n),
            RangeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

fn write_boost(f: &mut fmt::Formatter<'_>, boost: f64) -> fmt::Result {
    if boost != 1.0 {
        write!(f, "^{}", boost)?;
    }
    Ok(())
}

fn is_operator_word(text: &str) -> bool {
    ["and", "or", "not"].iter().any(|w| text.eq_ignore_ascii_case(w))
}

// NOT renders without its own parentheses, so it needs grouping whenever it
// sits inside another operator or a field scope.
fn write_grouped(f: &mut fmt::Formatter<'_>, node: &QueryNode) -> fmt::Result {
    if node.is_boolean(BooleanOperator::Not) {
        write!(f, "({})", node)
    } else {
        write!(f, "{}", node)
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term(q) => {
                write!(f, "{}", q.text)?;
                if q.boost == 1.0 && is_operator_word(&q.text) {
                    // `and^1` reads back as a term, bare `and` as an operator
                    return write!(f, "^1");
                }
                write_boost(f, q.boost)
            }
            QueryNode::Phrase(q) => {
                write!(f, "\"{}\"", q.text)?;
                if q.slop > 0 {
                    write!(f, "~{}", q.slop)?;
                }
                write_boost(f, q.boost)
            }
            QueryNode::Field(q) => {
                write!(f, "{}:", q.field)?;
                write_grouped(f, &q.query)
            }
            QueryNode::Boolean(q) => match (q.operator, q.children.as_slice()) {
                (BooleanOperator::Not, [only]) => {
                    write!(f, "NOT ")?;
                    write_grouped(f, only)
                }
                (BooleanOperator::Not, children) => {
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            write!(f, " NOT ")?;
                        }
                        write_grouped(f, child)?;
                    }
                    Ok(())
                }
                (op, children) => {
                    write!(f, "(")?;
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {} ", op)?;
                        }
                        write_grouped(f, child)?;
                    }
                    write!(f, ")")
                }
            },
            QueryNode::Wildcard(q) => {
                write!(f, "{}", q.pattern)?;
                write_boost(f, q.boost)
            }
            QueryNode::Fuzzy(q) => {
                write!(f, "{}~", q.term)?;
                if q.max_edits != DEFAULT_FUZZY_EDITS {
                    write!(f, "{}", q.max_edits)?;
                }
                write_boost(f, q.boost)
            }
            QueryNode::Range(q) => {
                let open = if q.include_start { '[' } else { '{' };
                let close = if q.include_end { ']' } else { '}' };
                write!(f, "{}:{}", q.field, open)?;
                match &q.start {
                    Some(v) => write!(f, "{}", v)?,
                    None => write!(f, "*")?,
                }
                write!(f, " TO ")?;
                match &q.end {
                    Some(v) => write!(f, "{}", v)?,
                    None => write!(f, "*")?,
                }
                write!(f, "{}", close)?;
                write_boost(f, q.boost)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_word_terms_keep_a_boost() {
        assert_eq!(QueryNode::term("and").to_string(), "and^1");
        assert_eq!(QueryNode::term("NOT").to_string(), "NOT^1");
        assert_eq!(QueryNode::term("or").with_boost(2.0).to_string(), "or^2");
        assert_eq!(QueryNode::term("android").to_string(), "android");
    }

    #[test]
    fn test_leaf_display() {
        assert_eq!(QueryNode::term("rust").to_string(), "rust");
        assert_eq!(QueryNode::term("rust").with_boost(2.0).to_string(), "rust^2");
        assert_eq!(QueryNode::phrase("deep learning").to_string(), "\"deep learning\"");
        assert_eq!(QueryNode::fuzzy("algoritm", 2).to_string(), "algoritm~");
        assert_eq!(QueryNode::fuzzy("algoritm", 1).to_string(), "algoritm~1");
        assert_eq!(QueryNode::wildcard("neur*").with_boost(0.5).to_string(), "neur*^0.5");
    }

    #[test]
    fn test_boolean_display() {
        let q = QueryNode::and(vec![QueryNode::term("a"), QueryNode::term("b")]);
        assert_eq!(q.to_string(), "(a AND b)");

        let not = QueryNode::not(vec![QueryNode::term("a"), QueryNode::term("b")]);
        assert_eq!(not.to_string(), "a NOT b");

        let nested = QueryNode::or(vec![not, QueryNode::term("c")]);
        assert_eq!(nested.to_string(), "((a NOT b) OR c)");

        let unary = QueryNode::not(vec![QueryNode::term("draft")]);
        assert_eq!(unary.to_string(), "NOT draft");
    }

    #[test]
    fn test_range_display() {
        let q = QueryNode::Range(RangeQuery {
            field: "year".into(),
            start: Some(RangeValue::Number(2023.0)),
            end: None,
            include_start: false,
            include_end: true,
            boost: 1.0,
        });
        assert_eq!(q.to_string(), "year:{2023 TO *]");
    }

    #[test]
    fn test_scale_boost_reaches_every_leaf() {
        let q = QueryNode::field(
            "title",
            QueryNode::or(vec![QueryNode::term("a"), QueryNode::phrase("b c")]),
        )
        .scale_boost(0.5);

        match q {
            QueryNode::Field(f) => match *f.query {
                QueryNode::Boolean(b) => {
                    assert!(b.children.iter().all(|c| c.boost() == Some(0.5)));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }
}
