use std::collections::BTreeMap;
use crate::query::ast::{BooleanOperator, QueryNode};

/// Inner queries grouped by the field that scopes them
pub fn extract_field_queries(node: &QueryNode) -> BTreeMap<String, Vec<QueryNode>> {
    fn collect(node: &QueryNode, out: &mut BTreeMap<String, Vec<QueryNode>>) {
        match node {
            QueryNode::Field(q) => {
                out.entry(q.field.clone()).or_default().push((*q.query).clone());
            }
            QueryNode::Boolean(q) => {
                for child in &q.children {
                    collect(child, out);
                }
            }
            _ => {}
        }
    }

    let mut out = BTreeMap::new();
    collect(node, &mut out);
    out
}

/// Rough cost estimate; higher is more expensive to execute
pub fn complexity(node: &QueryNode) -> usize {
    match node {
        QueryNode::Term(_) => 1,
        QueryNode::Phrase(q) => q.text.split_whitespace().count(),
        QueryNode::Field(q) => 1 + complexity(&q.query),
        QueryNode::Boolean(q) => q.children.iter().map(complexity).sum(),
        QueryNode::Wildcard(_) => 3,
        QueryNode::Fuzzy(_) => 5,
        QueryNode::Range(_) => 2,
    }
}

/// Structural problems in a query tree. Empty means valid.
pub fn validate(node: &QueryNode) -> Vec<String> {
    fn check(node: &QueryNode, errors: &mut Vec<String>) {
        match node {
            QueryNode::Term(q) => {
                if q.text.trim().is_empty() {
                    errors.push("Empty term in query".to_string());
                }
            }
            QueryNode::Phrase(q) => {
                if q.text.trim().is_empty() {
                    errors.push("Empty phrase in query".to_string());
                }
            }
            QueryNode::Field(q) => {
                if q.field.trim().is_empty() {
                    errors.push("Empty field name in field query".to_string());
                }
                check(&q.query, errors);
            }
            QueryNode::Boolean(q) => {
                if q.operator != BooleanOperator::Not && q.children.len() < 2 {
                    errors.push(format!(
                        "Boolean {} query needs at least 2 subqueries",
                        q.operator
                    ));
                }
                if q.operator == BooleanOperator::Not && !(1..=2).contains(&q.children.len()) {
                    errors.push("Boolean NOT query needs 1 or 2 subqueries".to_string());
                }
                for child in &q.children {
                    check(child, errors);
                }
            }
            QueryNode::Fuzzy(q) => {
                if q.max_edits > 2 {
                    errors.push("Fuzzy query max_edits must be 0-2".to_string());
                }
            }
            QueryNode::Range(q) => {
                if q.field.trim().is_empty() {
                    errors.push("Range query missing field name".to_string());
                }
            }
            QueryNode::Wildcard(_) => {}
        }
    }

    let mut errors = Vec::new();
    check(node, &mut errors);
    errors
}

/// Plain words the query looks for, skipping negated branches
pub fn terms(node: &QueryNode) -> Vec<String> {
    fn collect(node: &QueryNode, out: &mut Vec<String>) {
        match node {
            QueryNode::Term(q) => out.extend(q.text.split_whitespace().map(str::to_string)),
            QueryNode::Phrase(q) => out.extend(q.text.split_whitespace().map(str::to_string)),
            QueryNode::Fuzzy(q) => out.push(q.term.clone()),
            QueryNode::Wildcard(q) => {
                let base: String = q.pattern.chars().filter(|c| *c != '*' && *c != '?').collect();
                if !base.is_empty() {
                    out.push(base);
                }
            }
            QueryNode::Field(q) => collect(&q.query, out),
            QueryNode::Boolean(q) => match q.operator {
                BooleanOperator::Not => {
                    if q.children.len() == 2 {
                        collect(&q.children[0], out);
                    }
                }
                _ => {
                    for child in &q.children {
                        collect(child, out);
                    }
                }
            },
            QueryNode::Range(_) => {}
        }
    }

    let mut out = Vec::new();
    collect(node, &mut out);
    out.retain(|t| !t.is_empty());
    out
}
