use crate::analysis::token::Token;

/// Transforms a token stream
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn TokenFilter>;
}

/// Rewrites raw text before tokenization
pub trait CharFilter: Send + Sync {
    fn apply(&self, text: &str) -> String;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn CharFilter>;
}
