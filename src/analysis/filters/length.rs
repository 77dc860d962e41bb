use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Drops tokens whose character length falls outside `[min, max]`
pub struct LengthFilter {
    pub min: usize,
    pub max: usize,
}

impl LengthFilter {
    pub fn new(min: usize, max: usize) -> Self {
        LengthFilter { min, max }
    }
}

impl TokenFilter for LengthFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter(|token| {
                let len = token.char_len();
                len >= self.min && len <= self.max
            })
            .collect()
    }

    fn name(&self) -> &str {
        "length"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(LengthFilter::new(self.min, self.max))
    }
}
