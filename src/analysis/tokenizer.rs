use std::sync::LazyLock;
use regex::Regex;
use crate::analysis::token::{Token, TokenType};

// Letter/digit runs; underscores and punctuation separate tokens
static WORD_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\W_]+").expect("static pattern")
});

static AUTHOR_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+and\s+|,\s*").expect("static pattern")
});

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

/// Splits on punctuation and separators, keeping letter/digit runs
#[derive(Clone, Default)]
pub struct StandardTokenizer;

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        WORD_RUN.find_iter(text)
            .enumerate()
            .map(|(position, m)| Token::new(m.as_str().to_string(), position as u32, m.start()))
            .collect()
    }

    fn name(&self) -> &str {
        "standard"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(StandardTokenizer)
    }
}

/// Emits the whole trimmed input as a single token
#[derive(Clone, Default)]
pub struct KeywordTokenizer;

impl Tokenizer for KeywordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let offset = text.len() - text.trim_start().len();
        vec![Token::new(trimmed.to_string(), 0, offset).with_type(TokenType::Keyword)]
    }

    fn name(&self) -> &str {
        "keyword"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(KeywordTokenizer)
    }
}

/// Author-list tokenizer.
///
/// Splits a name list on ` and ` and commas, then emits for each name the
/// full name followed by its parts with `.`/`,` removed. Single-letter parts
/// are kept so initials stay searchable. Duplicates are dropped, first
/// occurrence wins.
#[derive(Clone, Default)]
pub struct AuthorTokenizer;

impl Tokenizer for AuthorTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut position = 0u32;

        let mut push = |tokens: &mut Vec<Token>, text: String, offset: usize| {
            if tokens.iter().any(|t| t.text == text) {
                return;
            }
            tokens.push(Token::new(text, position, offset).with_type(TokenType::Name));
            position += 1;
        };

        let mut start = 0;
        let mut names = Vec::new();
        for sep in AUTHOR_SEPARATOR.find_iter(text) {
            names.push((start, &text[start..sep.start()]));
            start = sep.end();
        }
        names.push((start, &text[start..]));

        for (offset, name) in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            push(&mut tokens, name.to_lowercase(), offset);

            for part in name.split_whitespace() {
                let clean: String = part.chars()
                    .filter(|c| *c != '.' && *c != ',')
                    .collect::<String>()
                    .to_lowercase();
                if !clean.is_empty() {
                    push(&mut tokens, clean, offset);
                }
            }
        }

        tokens
    }

    fn name(&self) -> &str {
        "author"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(AuthorTokenizer)
    }
}
