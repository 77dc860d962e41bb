use unicode_segmentation::UnicodeSegmentation;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Character n-grams over grapheme clusters
pub struct NGramFilter {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl NGramFilter {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        NGramFilter { min_gram, max_gram }
    }
}

impl TokenFilter for NGramFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut result = Vec::new();

        for token in tokens {
            let graphemes: Vec<&str> = token.text.graphemes(true).collect();

            for n in self.min_gram.max(1)..=self.max_gram.min(graphemes.len()) {
                for i in 0..=graphemes.len() - n {
                    let ngram: String = graphemes[i..i + n].concat();
                    let length = ngram.len();

                    result.push(Token {
                        text: ngram,
                        position: token.position,
                        offset: token.offset + graphemes[..i].iter().map(|g| g.len()).sum::<usize>(),
                        length,
                        token_type: token.token_type,
                    });
                }
            }
        }

        result
    }

    fn name(&self) -> &str {
        "ngram"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(NGramFilter {
            min_gram: self.min_gram,
            max_gram: self.max_gram,
        })
    }
}
