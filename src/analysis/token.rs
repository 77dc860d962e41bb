use serde::{Serialize, Deserialize};

/// Token representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,      // The token text
    pub position: u32,     // Position in the token stream (for proximity checks)
    pub offset: usize,     // Byte offset in original text
    pub length: usize,     // Token length in bytes
    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Word,
    Number,
    Name,     // Author name or name part
    Keyword,  // Whole field value kept as one token
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        let length = text.len();
        let token_type = if text.chars().all(|c| c.is_ascii_digit()) {
            TokenType::Number
        } else {
            TokenType::Word
        };
        Token {
            text,
            position,
            offset,
            length,
            token_type,
        }
    }

    pub fn with_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Length in characters, used by length filters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Join token texts the way processed field values are stored
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens.iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
