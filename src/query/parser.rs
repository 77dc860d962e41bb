use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till, take_till1, take_while1},
    character::complete::{char, digit0, digit1, one_of, space0, space1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{preceded, terminated},
};
use tracing::debug;
use crate::query::ast::{
    BooleanOperator, BooleanQuery, FuzzyQuery, PhraseQuery, QueryNode, RangeQuery, RangeValue,
    TermQuery, WildcardQuery, DEFAULT_FUZZY_EDITS,
};

/// Prefixes that look like `field:` but belong to URLs
const URI_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps", "file", "mailto"];

const DEFAULT_MAX_DEPTH: usize = 64;

/// Query parser for converting query strings to a `QueryNode` tree.
///
/// Examples:
/// - `machine learning` -> implicit AND
/// - `title:deep learning` -> field scope over `deep learning`
/// - `title:rust AND year:[2020 TO 2024]` -> AND of field and range
/// - `"exact phrase"~2` -> phrase with slop
/// - `algoritm~1` -> fuzzy term
/// - `neur*` -> wildcard
/// - `deep NOT shallow` -> difference
///
/// Parsing never fails: anything unrecognised becomes a term.
#[derive(Debug, Clone)]
pub struct QueryParser {
    pub max_depth: usize,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A top-level, whitespace-separated piece of the input with its byte span.
#[derive(Debug, Clone, Copy)]
struct Chunk<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

impl Chunk<'_> {
    fn keyword(&self) -> Option<BooleanOperator> {
        if self.text.eq_ignore_ascii_case("and") {
            Some(BooleanOperator::And)
        } else if self.text.eq_ignore_ascii_case("or") {
            Some(BooleanOperator::Or)
        } else if self.text.eq_ignore_ascii_case("not") {
            Some(BooleanOperator::Not)
        } else {
            None
        }
    }
}

impl QueryParser {
    pub fn new() -> Self {
        QueryParser { max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn parse(&self, input: &str) -> QueryNode {
        let node = self.parse_at(input, 0);
        debug!(query = input, parsed = %node, "parsed query");
        node
    }

    fn parse_at(&self, input: &str, depth: usize) -> QueryNode {
        let text = input.trim();
        if text.is_empty() {
            return QueryNode::term("");
        }
        if depth >= self.max_depth {
            return parse_leaf(text);
        }
        if let Some(inner) = strip_outer_parens(text) {
            return self.parse_at(inner, depth + 1);
        }

        let chunks = scan_chunks(text);

        if let Some(pos) = chunks.iter().position(|c| c.keyword().is_some()) {
            let keyword = chunks[pos];
            let operator = keyword.keyword().unwrap_or(BooleanOperator::And);
            let left = text[..keyword.start].trim();
            let right = text[keyword.end..].trim();
            return self.parse_boolean(operator, left, right, depth);
        }

        if let Ok((_, range)) = all_consuming(range_query).parse(text) {
            return QueryNode::Range(range);
        }

        // A leading `field:` scopes everything after it, unless the first
        // chunk is a complete range of its own.
        let leading_range = chunks
            .first()
            .is_some_and(|c| all_consuming(range_query).parse(c.text).is_ok());
        if !leading_range
            && let Ok((rest, field)) = field_prefix(text)
            && !rest.trim().is_empty()
            && !is_uri_scheme(field)
        {
            return QueryNode::field(field, self.parse_at(rest, depth + 1));
        }

        if chunks.len() > 1 {
            let children = chunks
                .iter()
                .map(|chunk| self.parse_at(chunk.text, depth + 1))
                .collect();
            return QueryNode::and(children);
        }

        parse_leaf(text)
    }

    fn parse_boolean(
        &self,
        operator: BooleanOperator,
        left: &str,
        right: &str,
        depth: usize,
    ) -> QueryNode {
        match (left.is_empty(), right.is_empty()) {
            // Dangling operators are dropped
            (true, true) => QueryNode::term(""),
            (true, false) if operator == BooleanOperator::Not => QueryNode::not(vec![
                self.parse_at(right, depth + 1),
            ]),
            (true, false) => self.parse_at(right, depth + 1),
            (false, true) => self.parse_at(left, depth + 1),
            (false, false) => {
                let left_node = self.parse_at(left, depth + 1);
                let right_node = self.parse_at(right, depth + 1);

                let mut children = vec![left_node];
                let grouped = strip_outer_parens(right).is_some();
                match right_node {
                    QueryNode::Boolean(inner)
                        if inner.operator == operator
                            && operator != BooleanOperator::Not
                            && !grouped =>
                    {
                        children.extend(inner.children);
                    }
                    other => children.push(other),
                }

                QueryNode::Boolean(BooleanQuery { operator, children })
            }
        }
    }
}

/// Phrase, fuzzy, wildcard or plain term, in that order
fn parse_leaf(text: &str) -> QueryNode {
    if let Ok((_, phrase)) = all_consuming(phrase_query).parse(text) {
        return QueryNode::Phrase(phrase);
    }
    if let Ok((_, fuzzy)) = all_consuming(fuzzy_query).parse(text) {
        return QueryNode::Fuzzy(fuzzy);
    }

    let (body, boost) = split_boost(text);
    if body.contains('*') || body.contains('?') {
        return QueryNode::Wildcard(WildcardQuery { pattern: body.to_string(), boost });
    }
    QueryNode::Term(TermQuery { text: body.to_string(), boost })
}

fn is_uri_scheme(field: &str) -> bool {
    URI_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(field))
}

/// Split the input into top-level chunks. Quotes, parentheses and brackets
/// group their contents. Unbalanced input falls back to plain whitespace
/// splitting.
fn scan_chunks(input: &str) -> Vec<Chunk<'_>> {
    grouped_chunks(input).unwrap_or_else(|| whitespace_chunks(input))
}

fn grouped_chunks(input: &str) -> Option<Vec<Chunk<'_>>> {
    let mut chunks = Vec::new();
    let mut depth: i32 = 0;
    let mut in_quote = false;
    let mut start: Option<usize> = None;

    for (i, c) in input.char_indices() {
        if c.is_whitespace() && depth == 0 && !in_quote {
            if let Some(s) = start.take() {
                chunks.push(Chunk { text: &input[s..i], start: s, end: i });
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        match c {
            '"' => in_quote = !in_quote,
            '(' | '[' | '{' if !in_quote => depth += 1,
            ')' | ']' | '}' if !in_quote => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }

    if depth != 0 || in_quote {
        return None;
    }
    if let Some(s) = start {
        chunks.push(Chunk { text: &input[s..], start: s, end: input.len() });
    }
    Some(chunks)
}

fn whitespace_chunks(input: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in input.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                chunks.push(Chunk { text: &input[s..i], start: s, end: i });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        chunks.push(Chunk { text: &input[s..], start: s, end: input.len() });
    }
    chunks
}

/// Inside of `( ... )` when one parenthesis pair wraps the whole input
fn strip_outer_parens(input: &str) -> Option<&str> {
    if !input.starts_with('(') || !input.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (i == input.len() - 1).then(|| &input[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn boost_value(input: &str) -> IResult<&str, f64> {
    map_res(recognize((digit1, opt((char('.'), digit0)))), str::parse::<f64>).parse(input)
}

fn boost_suffix(input: &str) -> IResult<&str, Option<f64>> {
    opt(preceded(char('^'), boost_value)).parse(input)
}

/// Strip a trailing `^boost` when what precedes it is non-empty
fn split_boost(text: &str) -> (&str, f64) {
    if let Some(idx) = text.rfind('^') {
        let (body, suffix) = (&text[..idx], &text[idx + 1..]);
        if !body.is_empty()
            && let Ok((_, boost)) = all_consuming(boost_value).parse(suffix)
        {
            return (body, boost);
        }
    }
    (text, 1.0)
}

fn field_prefix(input: &str) -> IResult<&str, &str> {
    terminated(take_while1(is_field_char), char(':')).parse(input)
}

fn range_value(input: &str) -> IResult<&str, Option<RangeValue>> {
    let (rest, raw) =
        take_while1(|c: char| !c.is_whitespace() && !"[]{}".contains(c)).parse(input)?;
    let value = match raw {
        "*" => None,
        _ => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(RangeValue::Number(n)),
            _ => Some(RangeValue::Text(raw.to_string())),
        },
    };
    Ok((rest, value))
}

fn range_query(input: &str) -> IResult<&str, RangeQuery> {
    let (rest, (field, open, _, start, _, _, _, end, _, close, boost)) = (
        field_prefix,
        one_of("[{"),
        space0,
        range_value,
        space1,
        tag("TO"),
        space1,
        range_value,
        space0,
        one_of("]}"),
        boost_suffix,
    )
        .parse(input)?;

    Ok((
        rest,
        RangeQuery {
            field: field.to_string(),
            start,
            end,
            include_start: open == '[',
            include_end: close == ']',
            boost: boost.unwrap_or(1.0),
        },
    ))
}

fn phrase_query(input: &str) -> IResult<&str, PhraseQuery> {
    let (rest, (_, text, _, slop, boost)) = (
        char('"'),
        take_till(|c: char| c == '"'),
        char('"'),
        opt(preceded(char('~'), map_res(digit1, str::parse::<u32>))),
        boost_suffix,
    )
        .parse(input)?;

    Ok((
        rest,
        PhraseQuery {
            text: text.to_string(),
            slop: slop.unwrap_or(0),
            boost: boost.unwrap_or(1.0),
        },
    ))
}

fn fuzzy_query(input: &str) -> IResult<&str, FuzzyQuery> {
    let (rest, (term, _, edits, boost)) = (
        take_till1(|c: char| c == '~' || c.is_whitespace()),
        char('~'),
        opt(map_res(digit1, str::parse::<u8>)),
        boost_suffix,
    )
        .parse(input)?;

    Ok((
        rest,
        FuzzyQuery {
            term: term.to_string(),
            max_edits: edits.unwrap_or(DEFAULT_FUZZY_EDITS),
            prefix_length: 0,
            boost: boost.unwrap_or(1.0),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> QueryNode {
        QueryParser::new().parse(s)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), QueryNode::term(""));
        assert_eq!(parse("   "), QueryNode::term(""));
    }

    #[test]
    fn test_implicit_and() {
        assert_eq!(
            parse("machine learning"),
            QueryNode::and(vec![QueryNode::term("machine"), QueryNode::term("learning")])
        );
    }

    #[test]
    fn test_field_and_range() {
        let q = parse("title:neural AND year:[2020 TO 2024]");
        assert_eq!(
            q,
            QueryNode::and(vec![
                QueryNode::field("title", QueryNode::term("neural")),
                QueryNode::Range(RangeQuery {
                    field: "year".into(),
                    start: Some(RangeValue::Number(2020.0)),
                    end: Some(RangeValue::Number(2024.0)),
                    include_start: true,
                    include_end: true,
                    boost: 1.0,
                }),
            ])
        );
    }

    #[test]
    fn test_field_scopes_following_words() {
        assert_eq!(
            parse("title:deep learning"),
            QueryNode::field(
                "title",
                QueryNode::and(vec![QueryNode::term("deep"), QueryNode::term("learning")])
            )
        );
        assert_eq!(
            parse("year:[2020 TO 2024] deep"),
            QueryNode::and(vec![
                QueryNode::Range(RangeQuery {
                    field: "year".into(),
                    start: Some(RangeValue::Number(2020.0)),
                    end: Some(RangeValue::Number(2024.0)),
                    include_start: true,
                    include_end: true,
                    boost: 1.0,
                }),
                QueryNode::term("deep"),
            ])
        );
        assert_eq!(
            parse("http://example.com paper"),
            QueryNode::and(vec![
                QueryNode::term("http://example.com"),
                QueryNode::term("paper"),
            ])
        );
    }

    #[test]
    fn test_exclusive_and_open_range() {
        match parse("year:{2023 TO *]") {
            QueryNode::Range(r) => {
                assert!(!r.include_start);
                assert!(r.include_end);
                assert_eq!(r.start, Some(RangeValue::Number(2023.0)));
                assert_eq!(r.end, None);
            }
            other => panic!("expected range, got {:?}", other),
        }
    }

    #[test]
    fn test_flattening_and_grouping() {
        assert_eq!(
            parse("a AND b AND c"),
            QueryNode::and(vec![QueryNode::term("a"), QueryNode::term("b"), QueryNode::term("c")])
        );
        assert_eq!(
            parse("a AND (b AND c)"),
            QueryNode::and(vec![
                QueryNode::term("a"),
                QueryNode::and(vec![QueryNode::term("b"), QueryNode::term("c")]),
            ])
        );
        assert_eq!(
            parse("a OR b AND c"),
            QueryNode::or(vec![
                QueryNode::term("a"),
                QueryNode::and(vec![QueryNode::term("b"), QueryNode::term("c")]),
            ])
        );
    }

    #[test]
    fn test_not_forms() {
        assert_eq!(
            parse("deep NOT shallow"),
            QueryNode::not(vec![QueryNode::term("deep"), QueryNode::term("shallow")])
        );
        assert_eq!(parse("NOT draft"), QueryNode::not(vec![QueryNode::term("draft")]));
        assert_eq!(parse("learning AND"), QueryNode::term("learning"));
        assert_eq!(parse("or learning"), QueryNode::term("learning"));
    }

    #[test]
    fn test_phrase_fuzzy_wildcard() {
        assert_eq!(
            parse("\"deep learning\"~3^2"),
            QueryNode::Phrase(PhraseQuery { text: "deep learning".into(), slop: 3, boost: 2.0 })
        );
        assert_eq!(parse("algoritm~1"), QueryNode::fuzzy("algoritm", 1));
        assert_eq!(parse("algoritm~"), QueryNode::fuzzy("algoritm", 2));
        assert_eq!(parse("neur*"), QueryNode::wildcard("neur*"));
        assert_eq!(parse("rust^1.5"), QueryNode::term("rust").with_boost(1.5));
    }

    #[test]
    fn test_uri_is_not_a_field() {
        assert_eq!(
            parse("http://example.com/paper"),
            QueryNode::term("http://example.com/paper")
        );
    }

    #[test]
    fn test_keywords_inside_quotes_and_brackets() {
        assert_eq!(parse("\"cats and dogs\""), QueryNode::phrase("cats and dogs"));
    }

    #[test]
    fn test_unbalanced_input_still_parses() {
        let q = parse("(deep learning");
        assert_eq!(q, QueryNode::and(vec![QueryNode::term("(deep"), QueryNode::term("learning")]));
    }

    #[test]
    fn test_operator_words_as_terms() {
        assert_eq!(parse("and^1"), QueryNode::term("and"));
        let node = QueryNode::or(vec![QueryNode::term("not"), QueryNode::term("cats")]);
        assert_eq!(parse(&node.to_string()), node);
    }

    #[test]
    fn test_round_trip() {
        for input in [
            "machine learning",
            "title:neural AND year:[2020 TO 2024]",
            "(a OR b) AND NOT c",
            "a NOT b OR c",
            "author:(smith OR jones)",
            "\"deep learning\"~2^1.5 OR algoritm~1",
            "venue:{2019 TO 2021}^2",
            "cats and^1 dogs",
            "title:or^1 OR not^1",
        ] {
            let first = parse(input);
            let second = parse(&first.to_string());
            assert_eq!(first, second, "round trip of {:?} via {:?}", input, first.to_string());
        }
    }
}
